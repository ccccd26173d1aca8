//! Output directory maintenance
//!
//! Generated files all land in one designated directory. It is created at
//! startup and reset before each run.

use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Create the output directory (and parents) if missing
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// Remove all regular files directly under `dir`.
///
/// Subdirectories are left in place. A missing directory is not an error.
pub async fn reset_dir(dir: &Path) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if !file_type.is_dir() {
            debug!("Removing {}", entry.path().display());
            tokio::fs::remove_file(entry.path()).await?;
        }
    }

    Ok(())
}
