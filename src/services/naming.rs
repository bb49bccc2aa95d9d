use crate::services::error::ConvertError;
use std::path::{Path, PathBuf};

/// Returns `desired` if nothing exists there, otherwise the first free
/// `"<stem> (N)<.ext>"` sibling for N in `1..max_probes`.
///
/// Only checks existence; callers must claim the path right away.
pub fn unique_path(desired: &Path, max_probes: u32) -> Result<PathBuf, ConvertError> {
    if !desired.exists() {
        return Ok(desired.to_path_buf());
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = desired
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    for i in 1..max_probes {
        let candidate = desired.with_file_name(format!("{stem} ({i}){suffix}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    tracing::error!(
        "Duplicate-name probing exhausted after {} candidates for {}",
        max_probes.saturating_sub(1),
        desired.display()
    );
    Err(ConvertError::NamingExhausted(desired.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_free_path_is_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("clip.mp3");

        assert_eq!(unique_path(&desired, 10_000).unwrap(), desired);
        // Still free, still unchanged.
        assert_eq!(unique_path(&desired, 10_000).unwrap(), desired);
    }

    #[test]
    fn test_probes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("clip.mp3");
        fs::write(&desired, b"x").unwrap();

        let first = unique_path(&desired, 10_000).unwrap();
        assert_eq!(first, dir.path().join("clip (1).mp3"));

        fs::write(&first, b"x").unwrap();
        fs::write(dir.path().join("clip (2).mp3"), b"x").unwrap();
        assert_eq!(
            unique_path(&desired, 10_000).unwrap(),
            dir.path().join("clip (3).mp3")
        );
    }

    #[test]
    fn test_gap_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("clip.mp3");
        fs::write(&desired, b"x").unwrap();
        fs::write(dir.path().join("clip (2).mp3"), b"x").unwrap();

        assert_eq!(
            unique_path(&desired, 10_000).unwrap(),
            dir.path().join("clip (1).mp3")
        );
    }

    #[test]
    fn test_name_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("README");
        fs::write(&desired, b"x").unwrap();

        assert_eq!(
            unique_path(&desired, 10_000).unwrap(),
            dir.path().join("README (1)")
        );
    }

    #[test]
    fn test_only_last_extension_is_split() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("movie.final.mp4");
        fs::write(&desired, b"x").unwrap();

        assert_eq!(
            unique_path(&desired, 10_000).unwrap(),
            dir.path().join("movie.final (1).mp4")
        );
    }

    #[test]
    fn test_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        let desired = dir.path().join("clip.mp3");
        fs::write(&desired, b"x").unwrap();
        for i in 1..5 {
            fs::write(dir.path().join(format!("clip ({i}).mp3")), b"x").unwrap();
        }

        let err = unique_path(&desired, 5).unwrap_err();
        assert!(matches!(err, ConvertError::NamingExhausted(ref p) if p == &desired));
        assert_eq!(err.to_string(), "Too many duplicate filenames.");

        // One more slot in the window resolves it.
        assert_eq!(
            unique_path(&desired, 6).unwrap(),
            dir.path().join("clip (5).mp3")
        );
    }
}
