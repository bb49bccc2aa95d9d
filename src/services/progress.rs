use serde::Serialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::models::{ConversionResult, RequestPhase};

/// Emitted after each item of a batch, in submission order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressEvent {
    /// 1-based position of the item just processed
    pub index: usize,
    pub total: usize,
    pub source: String,
    pub output: String,
    pub success: bool,
    pub diagnostic: Option<String>,
}

impl ProgressEvent {
    pub fn from_result(index: usize, total: usize, result: &ConversionResult) -> Self {
        Self {
            index,
            total,
            source: result.source_name(),
            output: result.output_name(),
            success: result.success,
            diagnostic: result.diagnostic.clone(),
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.index as f32 / self.total as f32
        }
    }
}

/// Receives request progress as it happens
pub trait ProgressReporter: Send + Sync {
    fn on_phase(&self, _phase: RequestPhase) {}

    /// Called before the transcoder starts on an item
    fn on_start(&self, _index: usize, _total: usize, _source: &str) {}

    fn on_item(&self, event: &ProgressEvent);
}

/// Writes progress to the log
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn on_phase(&self, phase: RequestPhase) {
        tracing::debug!("Request phase: {}", phase);
    }

    fn on_start(&self, index: usize, total: usize, source: &str) {
        tracing::info!("🎬 Converting {} ({}/{})", source, index, total);
    }

    fn on_item(&self, event: &ProgressEvent) {
        if event.success {
            tracing::info!(
                "✅ {} -> {} ({}/{}, {:.0}%)",
                event.source,
                event.output,
                event.index,
                event.total,
                event.fraction() * 100.0
            );
        } else {
            tracing::warn!(
                "❌ Failed: {} ({}/{})",
                event.source,
                event.index,
                event.total
            );
        }
    }
}

/// Message forwarded by [`ChannelProgress`]
#[derive(Debug, Clone)]
pub enum ProgressMessage {
    Phase(RequestPhase),
    Item(ProgressEvent),
}

/// Forwards progress to a channel, and to the log
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressMessage>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::UnboundedSender<ProgressMessage>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelProgress {
    fn on_phase(&self, phase: RequestPhase) {
        LogProgress.on_phase(phase);
        // Receiver gone means the client hung up; the batch still finishes.
        let _ = self.tx.send(ProgressMessage::Phase(phase));
    }

    fn on_start(&self, index: usize, total: usize, source: &str) {
        LogProgress.on_start(index, total, source);
    }

    fn on_item(&self, event: &ProgressEvent) {
        LogProgress.on_item(event);
        let _ = self.tx.send(ProgressMessage::Item(event.clone()));
    }
}
