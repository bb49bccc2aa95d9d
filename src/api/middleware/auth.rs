use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

pub const SESSION_COOKIE: &str = "session";
pub const ACCESS_WARNING_HEADER: &str = "x-access-warning";

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// Session token from `Authorization: Bearer`, `?token=` or the session cookie
pub fn session_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(t) = bearer_token(headers) {
        return Some(t);
    }

    let query = uri.query().unwrap_or_default();
    if let Some(t) = serde_urlencoded::from_str::<AuthQuery>(query)
        .ok()
        .and_then(|q| q.token)
    {
        return Some(t);
    }

    cookie_token(headers)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Lets a request through only for an unlocked session. With no password
/// configured everything passes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !state.gate.is_protected() {
        return Ok(next.run(req).await);
    }

    if let Some(token) = session_token(req.headers(), req.uri()) {
        if let Some(session) = state.sessions.get(&token) {
            req.extensions_mut().insert(session);
            return Ok(next.run(req).await);
        }
    }

    tracing::debug!("Rejected {} {}: no unlocked session", req.method(), req.uri());
    Err(StatusCode::UNAUTHORIZED)
}

/// Marks every response of an unprotected service with the access warning
pub async fn access_warning_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    if let Some(warning) = state.gate.warning() {
        response
            .headers_mut()
            .insert(ACCESS_WARNING_HEADER, HeaderValue::from_static(warning));
    }
    response
}
