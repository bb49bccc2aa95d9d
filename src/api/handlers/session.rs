use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::auth::{SESSION_COOKIE, session_token};
use crate::models::RequestPhase;

#[derive(Deserialize, ToSchema)]
pub struct UnlockRequest {
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UnlockResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionStatus {
    pub protected: bool,
    pub authenticated: bool,
    /// Where this client stands in the request flow
    pub phase: RequestPhase,
    pub warning: Option<String>,
}

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Access state of the calling client", body = SessionStatus)
    ),
    tag = "session"
)]
pub async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Json<SessionStatus> {
    let protected = state.gate.is_protected();
    let authenticated = !protected
        || session_token(&headers, &uri)
            .and_then(|t| state.sessions.get(&t))
            .is_some();

    let phase = if !authenticated {
        RequestPhase::Gated
    } else if !state.conversion.is_available().await {
        RequestPhase::Idle
    } else {
        RequestPhase::AwaitingUpload
    };

    Json(SessionStatus {
        protected,
        authenticated,
        phase,
        warning: state.gate.warning().map(str::to_string),
    })
}

#[utoipa::path(
    post,
    path = "/session/unlock",
    request_body = UnlockRequest,
    responses(
        (status = 200, description = "Password accepted, session created", body = UnlockResponse),
        (status = 401, description = "Wrong password")
    ),
    tag = "session"
)]
pub async fn unlock(
    State(state): State<AppState>,
    Json(payload): Json<UnlockRequest>,
) -> Result<Response, AppError> {
    if !state.gate.verify(&payload.password) {
        tracing::warn!("🔒 Unlock attempt with wrong password");
        return Err(AppError::Unauthorized("Wrong password.".to_string()));
    }

    // An open gate admits every request; nothing to remember.
    let session = if state.gate.is_protected() {
        let session = state.sessions.create();
        tracing::info!("🔓 Session unlocked, expires at {}", session.expires_at);
        session
    } else {
        state.sessions.mint()
    };

    let max_age = (session.expires_at - session.created_at).num_seconds();
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE, session.token, max_age
    );
    let cookie = HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.to_string()))?;

    let mut response = Json(UnlockResponse {
        token: session.token,
        expires_at: session.expires_at,
    })
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/session/logout",
    responses(
        (status = 204, description = "Session ended")
    ),
    tag = "session"
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    if let Some(token) = session_token(&headers, &uri) {
        if state.sessions.remove(&token) {
            tracing::info!("🔒 Session ended");
        }
    }

    let clear = format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE);
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Ok(value) = HeaderValue::from_str(&clear) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
