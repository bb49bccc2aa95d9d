use std::convert::Infallible;

use async_stream::stream;
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;
use crate::api::error::{AppError, public_message};
use crate::models::{RequestPhase, UploadedItem};
use crate::services::conversion::ConversionOutcome;
use crate::services::progress::{ChannelProgress, LogProgress, ProgressEvent, ProgressMessage};
use crate::utils::validation::{validate_extension, validate_file_size};

pub const CONVERTED_COUNT_HEADER: &str = "x-converted-count";
pub const FAILED_COUNT_HEADER: &str = "x-failed-count";
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Multipart form accepted by the convert endpoints
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertUpload {
    /// One `.mp4` file per `files` part; repeat the part for more
    #[schema(value_type = String, format = Binary)]
    pub files: Vec<u8>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertParams {
    /// `zip` (default) or `json`
    pub format: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ArchiveReport {
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    /// Zip bytes, base64 encoded
    pub data_base64: String,
}

#[derive(Serialize, ToSchema)]
pub struct ConversionReport {
    pub converted: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<ProgressEvent>,
    pub archive: ArchiveReport,
}

impl From<ConversionOutcome> for ConversionReport {
    fn from(outcome: ConversionOutcome) -> Self {
        let total = outcome.summary.total();
        let results = outcome
            .summary
            .results
            .iter()
            .enumerate()
            .map(|(i, r)| ProgressEvent::from_result(i + 1, total, r))
            .collect();

        Self {
            converted: outcome.summary.converted,
            failed: outcome.summary.failed,
            total,
            results,
            archive: ArchiveReport {
                filename: outcome.archive.filename.to_string(),
                content_type: outcome.archive.content_type.to_string(),
                size: outcome.archive.data.len(),
                data_base64: STANDARD.encode(&outcome.archive.data),
            },
        }
    }
}

/// One line of the `/convert/stream` response
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Phase { phase: RequestPhase },
    Progress(ProgressEvent),
    Done(ConversionReport),
    Error { message: String },
}

impl StreamEvent {
    fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to encode stream event: {}", e);
            r#"{"event":"error","message":"Internal Server Error"}"#.to_string()
        });
        line.push('\n');
        line
    }
}

impl From<ProgressMessage> for StreamEvent {
    fn from(message: ProgressMessage) -> Self {
        match message {
            ProgressMessage::Phase(phase) => StreamEvent::Phase { phase },
            ProgressMessage::Item(event) => StreamEvent::Progress(event),
        }
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Reads every `files` (or `file`) part into memory, rejecting anything that
/// is not an accepted video before it is staged.
async fn read_uploads(
    mut multipart: Multipart,
    max_size: usize,
) -> Result<Vec<UploadedItem>, AppError> {
    let mut items = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name != "files" && name != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::BadRequest("Upload is missing a filename".to_string()))?;

        validate_extension(&filename).map_err(|e| AppError::BadRequest(e.to_string()))?;

        let data = field.bytes().await.map_err(multipart_error)?;
        validate_file_size(data.len(), max_size)
            .map_err(|e| AppError::PayloadTooLarge(e.to_string()))?;

        tracing::debug!("Received upload {:?} ({} bytes)", filename, data.len());
        items.push(UploadedItem::new(filename, data));
    }

    if items.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".to_string()));
    }

    Ok(items)
}

fn zip_response(outcome: ConversionOutcome) -> Result<Response, AppError> {
    let disposition = format!("attachment; filename=\"{}\"", outcome.archive.filename);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, outcome.archive.content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(CONVERTED_COUNT_HEADER, outcome.summary.converted)
        .header(FAILED_COUNT_HEADER, outcome.summary.failed)
        .body(Body::from(outcome.archive.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[utoipa::path(
    post,
    path = "/convert",
    params(ConvertParams),
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Zip of extracted mp3 files, or a JSON report with format=json", content_type = "application/zip", body = String),
        (status = 400, description = "No files, or a file that is not .mp4"),
        (status = 401, description = "Session not unlocked"),
        (status = 503, description = "Transcoder not installed")
    ),
    security(
        ("session" = [])
    ),
    tag = "convert"
)]
pub async fn convert(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    // Refuse before reading any upload.
    state.conversion.ensure_available().await?;

    let items = read_uploads(multipart, state.config.max_upload_size).await?;
    tracing::info!("📥 Converting {} uploads", items.len());

    let outcome = state.conversion.run(&items, &LogProgress).await?;
    tracing::info!(
        "✅ Done. Converted: {} | Failed: {}",
        outcome.summary.converted,
        outcome.summary.failed
    );

    match params.format.as_deref() {
        Some("json") => Ok(Json(ConversionReport::from(outcome)).into_response()),
        None | Some("zip") => zip_response(outcome),
        Some(other) => Err(AppError::BadRequest(format!(
            "Unknown format '{}' (expected: zip|json)",
            other
        ))),
    }
}

#[utoipa::path(
    post,
    path = "/convert/stream",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Newline-delimited JSON: phase and progress events, then a final done or error event", content_type = "application/x-ndjson", body = String),
        (status = 400, description = "No files, or a file that is not .mp4"),
        (status = 401, description = "Session not unlocked"),
        (status = 503, description = "Transcoder not installed")
    ),
    security(
        ("session" = [])
    ),
    tag = "convert"
)]
pub async fn convert_stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    state.conversion.ensure_available().await?;

    let items = read_uploads(multipart, state.config.max_upload_size).await?;
    tracing::info!("📥 Converting {} uploads (streaming)", items.len());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let conversion = state.conversion.clone();
    let task = tokio::spawn(async move {
        let progress = ChannelProgress::new(tx);
        conversion.run(&items, &progress).await
    });

    let body = stream! {
        // Closes once the task drops its reporter.
        while let Some(message) = rx.recv().await {
            yield Ok::<_, Infallible>(StreamEvent::from(message).to_line());
        }

        let last = match task.await {
            Ok(Ok(outcome)) => StreamEvent::Done(ConversionReport::from(outcome)),
            Ok(Err(e)) => StreamEvent::Error { message: public_message(&e) },
            Err(e) => {
                tracing::error!("Conversion task failed: {}", e);
                StreamEvent::Error { message: "Internal Server Error".to_string() }
            }
        };
        yield Ok(last.to_line());
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}
