//! On-disk file handling for metadata documents and their backups

use crate::error::{Error, Result};
use crate::path::backup_path;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Replace `path` with `content` atomically.
///
/// The content is written to a temporary file in the same directory and then
/// renamed over the target, so a failure part-way through never leaves a
/// truncated document behind.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create temporary file in '{}': {}", dir.display(), e),
        ))
    })?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Remove `path` if it exists as a file. Returns whether anything was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    if path.is_file() {
        fs::remove_file(path)?;
        debug!("Removed existing file {}", path.display());
        return Ok(true);
    }
    Ok(false)
}

/// Copy `file` to its backup location.
///
/// An existing backup is kept unless `force` is set, so the pristine copy from
/// an earlier run is not replaced by an already-edited document.
pub fn create_backup(file: &Path, force: bool) -> Result<PathBuf> {
    let backup = backup_path(file);
    if backup.exists() {
        if !force {
            debug!("Keeping existing backup {}", backup.display());
            return Ok(backup);
        }
        remove_if_exists(&backup)?;
    }
    fs::copy(file, &backup)?;
    debug!("Backed up {} to {}", file.display(), backup.display());
    Ok(backup)
}
