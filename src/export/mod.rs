//! Writing export artifacts to disk.
//!
//! Each artifact is written through an atomic temp-file-and-rename so a
//! failed export never leaves a truncated `joined_file.*` behind.

mod atomic_writer;

use std::path::{Path, PathBuf};

use tracing::info;

pub use atomic_writer::AtomicFileWriter;

use crate::error::AppError;
use crate::report::ExportArtifact;

/// Writes each artifact into `output_dir` under its own file name.
///
/// # Returns
///
/// The written paths, in the order of `artifacts`.
///
/// # Errors
///
/// Returns `AppError::Io` if the directory cannot be created or any file
/// cannot be written. Files already persisted before the failure are kept.
pub fn write_artifacts(
    output_dir: &Path,
    artifacts: &[&ExportArtifact],
) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| AppError::Io(format!("Failed to create output directory: {}", e)))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let mut writer = AtomicFileWriter::new(output_dir.join(&artifact.file_name))?;
        writer.write_all(&artifact.bytes)?;
        let path = writer.finish()?;
        info!(
            "[EXPORT] Wrote {} ({} bytes)",
            path.display(),
            artifact.bytes.len()
        );
        written.push(path);
    }

    Ok(written)
}
