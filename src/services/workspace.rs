use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::models::{StagedInput, UploadedItem};
use crate::services::error::ConvertError;
use crate::services::naming::unique_path;
use crate::utils::validation::sanitize_filename;

const INPUT_DIR: &str = "input";
const OUTPUT_DIR: &str = "output_mp3";

/// Scratch space owned by a single conversion request.
///
/// Holds `input/` and `output_mp3/` under a fresh temporary directory that is
/// removed when the workspace is dropped, whichever way the request ends.
pub struct Workspace {
    root: TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl Workspace {
    pub async fn create() -> Result<Self, ConvertError> {
        let root = tempfile::Builder::new().prefix("mp3-extractor-").tempdir()?;
        let input_dir = root.path().join(INPUT_DIR);
        let output_dir = root.path().join(OUTPUT_DIR);
        tokio::fs::create_dir_all(&input_dir).await?;
        tokio::fs::create_dir_all(&output_dir).await?;

        tracing::debug!("Created workspace {}", root.path().display());
        Ok(Self {
            root,
            input_dir,
            output_dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes each upload under a sanitized, collision-free name, keeping
    /// upload order.
    pub async fn stage(
        &self,
        items: &[UploadedItem],
        max_probes: u32,
    ) -> Result<Vec<StagedInput>, ConvertError> {
        let mut staged = Vec::with_capacity(items.len());

        for item in items {
            let safe_name = sanitize_filename(&item.filename);
            let path = unique_path(&self.input_dir.join(&safe_name), max_probes)?;
            tokio::fs::write(&path, &item.data).await?;

            if safe_name != item.filename {
                tracing::debug!("Sanitized upload name {:?} -> {:?}", item.filename, safe_name);
            }
            staged.push(StagedInput {
                path,
                original_name: item.filename.clone(),
            });
        }

        Ok(staged)
    }
}
