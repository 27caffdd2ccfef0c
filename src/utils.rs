// ABOUTME: Filesystem helpers for the folio command line tools
// ABOUTME: Validates inputs and prepares output locations

use crate::errors::{FolioError, Result};
use log::warn;
use std::path::{Path, PathBuf};

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(FolioError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(FolioError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(FolioError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory_exists(parent),
        _ => Ok(()),
    }
}

/// Create the directory if needed and prove it accepts new files.
pub fn validate_directory_writable(path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    let marker = path.join(format!(".folio_write_check_{}.tmp", uuid::Uuid::new_v4()));
    match std::fs::File::create(&marker) {
        Ok(_) => {
            if let Err(e) = std::fs::remove_file(&marker) {
                warn!("Failed to clean up {:?}: {}", marker, e);
            }
            Ok(())
        }
        Err(e) => Err(FolioError::ValidationError(format!(
            "Directory is not writable: {:?} - {}",
            path, e
        ))),
    }
}

/// Get the absolute path
pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        FolioError::ValidationError(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

/// Directory holding `file`, `.` for a bare file name.
pub fn parent_or_current(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
