use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::error::ConvertError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Conversion(e) => {
                let status = match e {
                    ConvertError::ToolUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, public_message(&e))
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// What a client may see of a request-fatal conversion error. Workspace and
/// archive failures are logged and masked.
pub fn public_message(err: &ConvertError) -> String {
    match err {
        ConvertError::ToolUnavailable(_) => err.to_string(),
        ConvertError::NamingExhausted(path) => {
            tracing::error!("Naming exhausted for {}", path.display());
            err.to_string()
        }
        ConvertError::Io(_) | ConvertError::Archive(_) => {
            tracing::error!("Conversion error: {:?}", err);
            "Internal Server Error".to_string()
        }
    }
}
