use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

/// File name offered at the download boundary.
pub const ARCHIVE_FILENAME: &str = "mp3_outputs.zip";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// One uploaded file as received; the name is untrusted.
#[derive(Debug, Clone)]
pub struct UploadedItem {
    pub filename: String,
    pub data: Bytes,
}

impl UploadedItem {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// An upload written to the request workspace under a sanitized, unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    pub path: PathBuf,
    pub original_name: String,
}

impl StagedInput {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub output: PathBuf,
    pub success: bool,
    /// Truncated transcoder stderr, only set on failure
    pub diagnostic: Option<String>,
}

impl ConversionResult {
    pub fn source_name(&self) -> String {
        display_name(&self.source)
    }

    pub fn output_name(&self) -> String {
        display_name(&self.output)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub results: Vec<ConversionResult>,
    pub converted: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn push(&mut self, result: ConversionResult) {
        if result.success {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Outputs of successful items, in submission order.
    pub fn successful_outputs(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.output.clone())
            .collect()
    }
}

/// Zip bytes handed to the download boundary.
#[derive(Debug, Clone)]
pub struct OutputArchive {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

impl OutputArchive {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            filename: ARCHIVE_FILENAME,
            content_type: ARCHIVE_CONTENT_TYPE,
            data,
        }
    }
}

/// Linear lifecycle of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    Gated,
    AwaitingUpload,
    Converting,
    Packaging,
    Ready,
}

impl RequestPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Idle => "idle",
            RequestPhase::Gated => "gated",
            RequestPhase::AwaitingUpload => "awaiting_upload",
            RequestPhase::Converting => "converting",
            RequestPhase::Packaging => "packaging",
            RequestPhase::Ready => "ready",
        }
    }
}

impl std::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
