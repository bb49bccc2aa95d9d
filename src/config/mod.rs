use std::env;

/// Runtime configuration for the converter service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Shared secret gating the upload flow; `None` leaves the service open
    pub app_password: Option<String>,

    /// Transcoder binary name or path (default: "ffmpeg")
    pub ffmpeg_bin: String,

    /// Maximum request body size in bytes (default: 1 GB)
    pub max_upload_size: usize,

    /// Upper bound for " (N)" duplicate-name probing (default: 10,000)
    pub max_duplicate_probes: u32,

    /// Characters of transcoder stderr kept per failed item (default: 2000)
    pub diagnostic_limit: usize,

    /// Lifetime of an unlocked session in hours (default: 24)
    pub session_ttl_hours: i64,

    /// Interval between expired-session sweeps in seconds (default: 600)
    pub session_sweep_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_password: None,
            ffmpeg_bin: "ffmpeg".to_string(),
            max_upload_size: 1024 * 1024 * 1024, // 1 GB
            max_duplicate_probes: 10_000,
            diagnostic_limit: 2000,
            session_ttl_hours: 24,
            session_sweep_secs: 600,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            app_password: env::var("APP_PASSWORD")
                .ok()
                .and_then(|v| normalize_password(&v)),

            ffmpeg_bin: env::var("FFMPEG_BIN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default.ffmpeg_bin),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_duplicate_probes: env::var("MAX_DUPLICATE_PROBES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u32| *v > 0)
                .unwrap_or(default.max_duplicate_probes),

            diagnostic_limit: env::var("DIAGNOSTIC_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.diagnostic_limit),

            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(default.session_ttl_hours),

            session_sweep_secs: env::var("SESSION_SWEEP_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u64| *v > 0)
                .unwrap_or(default.session_sweep_secs),
        }
    }

    /// Create config for development (open access, small limits)
    pub fn development() -> Self {
        Self {
            app_password: None,
            max_upload_size: 64 * 1024 * 1024,
            ..Self::default()
        }
    }

    /// Same as `development()` but gated behind the given password
    pub fn with_password(password: &str) -> Self {
        Self {
            app_password: normalize_password(password),
            ..Self::development()
        }
    }

    pub fn is_protected(&self) -> bool {
        self.app_password.is_some()
    }
}

/// Whitespace-only secrets count as unset.
fn normalize_password(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
