//! ZIP packaging for multi-file uploads.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip write failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("zip i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Pack named byte blobs into a single in-memory ZIP archive.
///
/// Output entry order equals input order; zero-length inputs are skipped
/// entirely rather than stored as empty entries.
pub fn pack(inputs: &[(String, Vec<u8>)]) -> Result<Vec<u8>, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, bytes) in inputs {
        if bytes.is_empty() {
            tracing::debug!(file_name = %name, "skipping empty file");
            continue;
        }
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}
