//! Input validation: make sure the path names a readable regular file
//! before any strategy touches it.
//!
//! The file is not checked for a `%PDF` header. Every backend reports an
//! unreadable document through its own attempt, and some producers emit
//! junk before the header that the backends tolerate.

use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local file path for extraction.
pub fn resolve_local(path: &Path) -> Result<PathBuf, ExtractError> {
    let path = path.to_path_buf();

    let meta = match std::fs::metadata(&path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => return Err(ExtractError::FileNotFound { path }),
    };

    if !meta.is_file() {
        return Err(ExtractError::NotAFile { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => return Err(ExtractError::FileNotFound { path }),
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
