//! File permission utilities for restricting access to sensitive files.

use std::path::Path;

use crate::error::{ManagerError, Result};

/// Set restrictive permissions (owner-only read/write) on a file.
///
/// On Unix systems this sets mode 0o600. On other platforms this is a no-op
/// since the permission model differs.
pub fn restrict_file_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms).map_err(|e| {
            ManagerError::persistence(format!(
                "Failed to set permissions on {}: {}",
                path.display(),
                e
            ))
        })?;
    }

    #[cfg(not(unix))]
    {
        let _ = path; // suppress unused warning
    }

    Ok(())
}

/// Copy `from` to `to`, creating parent directories, and make the copy
/// owner-only.
pub async fn copy_private(from: &Path, to: &Path) -> Result<()> {
    let persist_err = |e: std::io::Error| {
        ManagerError::persistence(format!(
            "Failed to copy {} to {}: {}",
            from.display(),
            to.display(),
            e
        ))
    };

    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
    }
    // Copying a file onto itself would truncate it.
    let same_file = match (tokio::fs::canonicalize(from).await, tokio::fs::canonicalize(to).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_file {
        tokio::fs::copy(from, to).await.map_err(persist_err)?;
    }
    restrict_file_permissions(to)
}
