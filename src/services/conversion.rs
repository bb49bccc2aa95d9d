use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{BatchSummary, OutputArchive, RequestPhase, UploadedItem};
use crate::services::archive;
use crate::services::converter::BatchConverter;
use crate::services::error::ConvertError;
use crate::services::progress::ProgressReporter;
use crate::services::transcoder::Transcoder;
use crate::services::workspace::Workspace;

pub struct ConversionOutcome {
    pub summary: BatchSummary,
    pub archive: OutputArchive,
}

/// Runs one conversion request end to end: precheck, staging, sequential
/// conversion and packaging, all inside a workspace dropped on return.
pub struct ConversionService {
    transcoder: Arc<dyn Transcoder>,
    converter: BatchConverter,
    max_probes: u32,
}

impl ConversionService {
    pub fn new(transcoder: Arc<dyn Transcoder>, config: &AppConfig) -> Self {
        let converter = BatchConverter::new(
            transcoder.clone(),
            config.max_duplicate_probes,
            config.diagnostic_limit,
        );
        Self {
            transcoder,
            converter,
            max_probes: config.max_duplicate_probes,
        }
    }

    pub fn transcoder_name(&self) -> &str {
        self.transcoder.name()
    }

    pub async fn is_available(&self) -> bool {
        self.transcoder.health_check().await
    }

    /// Fails with `ToolUnavailable` when the transcoder cannot be found
    pub async fn ensure_available(&self) -> Result<(), ConvertError> {
        if self.is_available().await {
            Ok(())
        } else {
            tracing::error!("{} is not installed in this environment", self.transcoder_name());
            Err(ConvertError::ToolUnavailable(self.transcoder_name().to_string()))
        }
    }

    pub async fn run(
        &self,
        items: &[UploadedItem],
        progress: &dyn ProgressReporter,
    ) -> Result<ConversionOutcome, ConvertError> {
        self.ensure_available().await?;

        let workspace = Workspace::create().await?;
        let staged = workspace.stage(items, self.max_probes).await?;
        tracing::info!(
            "📥 Staged {} uploads in {}",
            staged.len(),
            workspace.path().display()
        );

        let summary = self
            .converter
            .convert_all(&staged, workspace.output_dir(), progress)
            .await?;

        progress.on_phase(RequestPhase::Packaging);
        let data = archive::pack(&summary.successful_outputs()).await?;
        progress.on_phase(RequestPhase::Ready);

        Ok(ConversionOutcome {
            summary,
            archive: OutputArchive::new(data),
        })
    }
}
