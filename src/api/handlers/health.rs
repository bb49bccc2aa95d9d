use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use crate::AppState;
use crate::services::transcoder::SETTINGS_CAPTION;
use crate::utils::validation::ACCEPTED_EXTENSIONS;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub transcoder: String,
    pub version: String,
}

#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    /// Audio settings passed to the transcoder
    pub ffmpeg_settings: String,
    /// Whether a shared secret gates the upload flow
    pub protected: bool,
    pub warning: Option<String>,
    /// False when the transcoder is missing; no upload is accepted then
    pub upload_enabled: bool,
    pub error: Option<String>,
    pub accepted_extensions: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service description and upload availability", body = ServiceInfo)
    ),
    tag = "system"
)]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let upload_enabled = state.conversion.is_available().await;

    Json(ServiceInfo {
        service: "MP4 → MP3 Converter".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ffmpeg_settings: SETTINGS_CAPTION.to_string(),
        protected: state.gate.is_protected(),
        warning: state.gate.warning().map(str::to_string),
        upload_enabled,
        error: (!upload_enabled).then(|| {
            format!(
                "{} is not installed in this environment.",
                state.conversion.transcoder_name()
            )
        }),
        accepted_extensions: ACCEPTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let transcoder_status = if state.conversion.is_available().await {
        "available"
    } else {
        "missing"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        transcoder: transcoder_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
