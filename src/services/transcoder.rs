use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::AppConfig;

/// Fixed audio settings, shown to users as-is.
pub const SETTINGS_CAPTION: &str = "-vn -ac 1 -ar 16000 -b:a 96k";

/// Raw outcome of one transcoder run
#[derive(Debug, Clone)]
pub struct TranscodeOutput {
    /// Process exited with status zero
    pub exit_ok: bool,
    pub exit_code: Option<i32>,
    /// Captured diagnostic stream
    pub stderr: Vec<u8>,
}

/// External audio extraction tool
#[async_trait::async_trait]
pub trait Transcoder: Send + Sync {
    /// Tool name used in availability errors
    fn name(&self) -> &str;

    /// Whether the tool can be launched in this environment
    async fn health_check(&self) -> bool;

    /// Extract the audio of `input` into `output`, overwriting it.
    ///
    /// `Err` means the tool could not be run at all; a run that fails is an
    /// `Ok` with `exit_ok == false`.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<TranscodeOutput>;
}

/// ffmpeg invoked as a subprocess with a fixed argument template
pub struct FfmpegTranscoder {
    binary: String,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ffmpeg_bin.clone())
    }

    /// Resolves the binary on `PATH` (or checks it directly if it is a path).
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.binary).ok()
    }
}

/// `-y -i <input> -vn -ac 1 -ar 16000 -b:a 96k <output>`
pub fn ffmpeg_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(SETTINGS_CAPTION.split(' ').map(OsString::from));
    args.push(output.into());
    args
}

#[async_trait::async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn health_check(&self) -> bool {
        self.locate().is_some()
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<TranscodeOutput> {
        let program = self
            .locate()
            .unwrap_or_else(|| PathBuf::from(&self.binary));

        tracing::debug!(
            "Running {} {:?}",
            program.display(),
            ffmpeg_args(input, output)
        );

        let out = Command::new(&program)
            .args(ffmpeg_args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", program.display()))?;

        Ok(TranscodeOutput {
            exit_ok: out.status.success(),
            exit_code: out.status.code(),
            stderr: out.stderr,
        })
    }
}
