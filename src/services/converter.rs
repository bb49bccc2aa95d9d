use std::path::Path;
use std::sync::Arc;

use crate::models::{BatchSummary, ConversionResult, RequestPhase, StagedInput};
use crate::services::error::ConvertError;
use crate::services::naming::unique_path;
use crate::services::progress::{ProgressEvent, ProgressReporter};
use crate::services::transcoder::Transcoder;

/// Runs staged inputs through the transcoder one at a time.
pub struct BatchConverter {
    transcoder: Arc<dyn Transcoder>,
    max_probes: u32,
    diagnostic_limit: usize,
}

impl BatchConverter {
    pub fn new(transcoder: Arc<dyn Transcoder>, max_probes: u32, diagnostic_limit: usize) -> Self {
        Self {
            transcoder,
            max_probes,
            diagnostic_limit,
        }
    }

    /// Converts every input in order. Only naming exhaustion aborts the
    /// batch; an item that fails is recorded and the next one starts.
    pub async fn convert_all(
        &self,
        inputs: &[StagedInput],
        output_dir: &Path,
        progress: &dyn ProgressReporter,
    ) -> Result<BatchSummary, ConvertError> {
        progress.on_phase(RequestPhase::Converting);

        let total = inputs.len();
        let mut summary = BatchSummary::default();

        for (i, input) in inputs.iter().enumerate() {
            let index = i + 1;
            let stem = input
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let output = unique_path(&output_dir.join(format!("{stem}.mp3")), self.max_probes)?;

            progress.on_start(index, total, &input.file_name());

            let (success, diagnostic) = match self.transcoder.transcode(&input.path, &output).await
            {
                Ok(run) => {
                    if run.exit_ok && has_content(&output).await {
                        (true, None)
                    } else {
                        tracing::debug!(
                            "Transcoder exit code {:?} for {} (uploaded as {:?})",
                            run.exit_code,
                            input.path.display(),
                            input.original_name
                        );
                        (false, Some(truncate_diagnostic(&run.stderr, self.diagnostic_limit)))
                    }
                }
                Err(e) => {
                    tracing::error!("Transcoder launch failed: {:#}", e);
                    let message = format!("{:#}", e);
                    (false, Some(truncate_diagnostic(message.as_bytes(), self.diagnostic_limit)))
                }
            };

            let result = ConversionResult {
                source: input.path.clone(),
                output,
                success,
                diagnostic,
            };
            progress.on_item(&ProgressEvent::from_result(index, total, &result));
            summary.push(result);
        }

        tracing::info!(
            "Done. Converted: {} | Failed: {}",
            summary.converted,
            summary.failed
        );

        Ok(summary)
    }
}

/// Output exists and is non-empty
async fn has_content(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Lossy UTF-8 decode, cut to at most `limit` characters
pub fn truncate_diagnostic(raw: &[u8], limit: usize) -> String {
    String::from_utf8_lossy(raw).chars().take(limit).collect()
}
