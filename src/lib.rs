pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::conversion::ConversionService;
use crate::services::session::{AccessGate, SessionStore};
use crate::services::transcoder::Transcoder;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::index,
        api::handlers::health::health_check,
        api::handlers::session::session_status,
        api::handlers::session::unlock,
        api::handlers::session::logout,
        api::handlers::convert::convert,
        api::handlers::convert::convert_stream,
    ),
    components(
        schemas(
            api::handlers::health::ServiceInfo,
            api::handlers::health::HealthResponse,
            api::handlers::session::UnlockRequest,
            api::handlers::session::UnlockResponse,
            api::handlers::session::SessionStatus,
            api::handlers::convert::ConvertUpload,
            api::handlers::convert::ArchiveReport,
            api::handlers::convert::ConversionReport,
            services::progress::ProgressEvent,
            models::RequestPhase,
        )
    ),
    modifiers(&SessionSecurity),
    tags(
        (name = "system", description = "Service information and health"),
        (name = "session", description = "Password gate and sessions"),
        (name = "convert", description = "MP4 to MP3 conversion")
    )
)]
pub struct ApiDoc;

struct SessionSecurity;

impl Modify for SessionSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gate: Arc<AccessGate>,
    pub sessions: Arc<SessionStore>,
    pub conversion: Arc<ConversionService>,
}

impl AppState {
    pub fn new(config: AppConfig, transcoder: Arc<dyn Transcoder>) -> Self {
        let gate = AccessGate::new(config.app_password.as_deref());
        let sessions = SessionStore::new(config.session_ttl_hours);
        let conversion = ConversionService::new(transcoder, &config);

        Self {
            gate: Arc::new(gate),
            sessions: Arc::new(sessions),
            conversion: Arc::new(conversion),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_size + 10 * 1024 * 1024; // multipart overhead

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::index))
        .route("/health", get(api::handlers::health::health_check))
        .route("/session", get(api::handlers::session::session_status))
        .route("/session/unlock", post(api::handlers::session::unlock))
        .route("/session/logout", post(api::handlers::session::logout))
        .route(
            "/convert",
            post(api::handlers::convert::convert).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/convert/stream",
            post(api::handlers::convert::convert_stream).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::access_warning_middleware,
        ))
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
