use std::io::{Cursor, Write};
use std::path::PathBuf;

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::services::error::ConvertError;

/// Zips the given files into an in-memory, deflate-compressed archive.
///
/// Each file becomes one entry named by its base name; directories are not
/// preserved. Entries follow the order of `outputs`.
pub async fn pack(outputs: &[PathBuf]) -> Result<Vec<u8>, ConvertError> {
    let mut files = Vec::with_capacity(outputs.len());
    for path in outputs {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Not a file path: {}", path.display()),
                )
            })?;
        files.push((name, tokio::fs::read(path).await?));
    }

    let bytes = write_zip(&files)?;
    tracing::debug!("📦 Packed {} entries ({} bytes)", files.len(), bytes.len());
    Ok(bytes)
}

fn write_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ConvertError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in files {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }

    Ok(writer.finish()?.into_inner())
}
