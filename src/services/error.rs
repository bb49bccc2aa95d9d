use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole conversion request.
///
/// Per-item transcoder failures are not errors; they are recorded on the
/// item's `ConversionResult` and the batch carries on.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("{0} is not installed in this environment.")]
    ToolUnavailable(String),

    #[error("Too many duplicate filenames.")]
    NamingExhausted(PathBuf),

    #[error("Workspace I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}
