use anyhow::{Result, anyhow};
use std::path::Path;

/// Name used when sanitizing leaves nothing usable.
pub const DEFAULT_FILENAME: &str = "file";

/// Upload extensions accepted at intake (compared case-insensitively).
pub const ACCEPTED_EXTENSIONS: &[&str] = &["mp4"];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '(' | ')' | ' ')
}

/// Maps an untrusted filename onto a safe local entry name.
///
/// NUL characters are dropped and surrounding whitespace trimmed, then every
/// run of characters outside `[\w.\-() ]` becomes a single underscore. Never
/// returns an empty string, `.` or `..`.
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw.trim().chars().filter(|&c| c != '\0').collect();

    let mut sanitized = String::with_capacity(cleaned.len());
    let mut in_disallowed_run = false;
    for c in cleaned.chars() {
        if is_allowed(c) {
            sanitized.push(c);
            in_disallowed_run = false;
        } else if !in_disallowed_run {
            sanitized.push('_');
            in_disallowed_run = true;
        }
    }

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return DEFAULT_FILENAME.to_string();
    }

    sanitized
}

/// Rejects uploads whose name does not carry an accepted video extension
pub fn validate_extension(filename: &str) -> Result<()> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(anyhow!(ValidationError {
            code: "UNSUPPORTED_EXTENSION",
            message: format!(
                "'{}' is not accepted. Only .{} files can be converted.",
                filename,
                ACCEPTED_EXTENSIONS.join(", .")
            ),
        })),
    }
}

/// Validates an upload's size against the configured limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches_allow_list(name: &str) -> bool {
        !name.is_empty() && name.chars().all(is_allowed)
    }

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename("my clip (2)-final.mp4"), "my clip (2)-final.mp4");
        assert_eq!(sanitize_filename("日本語.mp4"), "日本語.mp4");
        assert_eq!(sanitize_filename("  padded.mp4 \t"), "padded.mp4");
    }

    #[test]
    fn test_sanitize_collapses_disallowed_runs() {
        assert_eq!(sanitize_filename("a<>|b.mp4"), "a_b.mp4");
        assert_eq!(sanitize_filename("a:b;c.mp4"), "a_b_c.mp4");
        assert_eq!(sanitize_filename("tab\there.mp4"), "tab_here.mp4");
    }

    #[test]
    fn test_sanitize_strips_nul() {
        assert_eq!(sanitize_filename("cl\0ip.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename("\0\0"), DEFAULT_FILENAME);
    }

    #[test]
    fn test_sanitize_never_empty() {
        assert_eq!(sanitize_filename(""), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename("   "), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename("."), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename(".."), DEFAULT_FILENAME);
        assert_eq!(sanitize_filename("///"), "_");
    }

    #[test]
    fn test_sanitize_path_traversal() {
        let name = sanitize_filename("../../etc/passwd.mp4");
        assert_eq!(name, ".._.._etc_passwd.mp4");
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert!(!name.contains("../"));

        let name = sanitize_filename("..\\..\\windows\\clip.mp4");
        assert!(!name.contains('\\'));
        assert_eq!(Path::new(&name).file_name().unwrap().to_str(), Some(name.as_str()));
    }

    #[test]
    fn test_sanitize_output_matches_allow_list() {
        let samples = [
            "weird*name?.mp4",
            "emoji 🎬 clip.mp4",
            "quote\"d'.mp4",
            "new\nline.mp4",
            "%00%2e%2e.mp4",
            "\u{7f}\u{1b}[31m.mp4",
        ];
        for raw in samples {
            let name = sanitize_filename(raw);
            assert!(matches_allow_list(&name), "{raw:?} -> {name:?}");
        }
    }

    #[test]
    fn test_validate_extension() {
        assert!(validate_extension("clip.mp4").is_ok());
        assert!(validate_extension("CLIP.MP4").is_ok());
        assert!(validate_extension("clip.Mp4").is_ok());

        assert!(validate_extension("clip.mov").is_err());
        assert!(validate_extension("clip.mp4.exe").is_err());
        assert!(validate_extension("mp4").is_err());
        assert!(validate_extension("").is_err());
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        assert!(validate_file_size(2049, 2048).is_err());
    }
}
