//! Path confinement for the module tree
//!
//! Every directory or file handed to the rest of the system must live
//! strictly under an allowed root and must not be, or pass through, a
//! symbolic link.

use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::modules::error::SecurityError;

/// Confine `path` to `allowed_root`, returning its canonical absolute form.
///
/// Unexpected filesystem errors are reported as [`SecurityError::Io`] rather
/// than treated as "not found".
pub fn confine(path: &Path, allowed_root: &Path) -> Result<PathBuf, SecurityError> {
    let root = allowed_root.canonicalize().map_err(|error| SecurityError::Io {
        path: allowed_root.to_path_buf(),
        error,
    })?;

    let lexical = normalize_lexically(&absolutize(path)?);
    let lexical_root = normalize_lexically(&absolutize(allowed_root)?);

    let relative = lexical
        .strip_prefix(&lexical_root)
        .or_else(|_| lexical.strip_prefix(&root))
        .map_err(|_| SecurityError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.clone(),
        })?;

    // Walk down from the root so a symlinked intermediate directory is caught
    // even when it points back inside the tree.
    let mut cursor = root.clone();
    for component in relative.components() {
        cursor.push(component);
        let metadata = std::fs::symlink_metadata(&cursor).map_err(|error| SecurityError::Io {
            path: cursor.clone(),
            error,
        })?;
        if metadata.file_type().is_symlink() {
            warn!("Symlink detected: {}", cursor.display());
            return Err(SecurityError::Symlink { path: cursor });
        }
    }

    let resolved = cursor.canonicalize().map_err(|error| SecurityError::Io {
        path: cursor.clone(),
        error,
    })?;

    if resolved == root || !resolved.starts_with(&root) {
        return Err(SecurityError::OutsideRoot {
            path: path.to_path_buf(),
            root,
        });
    }

    debug!("Confined {} under {}", resolved.display(), root.display());
    Ok(resolved)
}

/// Reject files larger than `max_size` bytes. A missing file passes.
pub fn check_file_size(file: &Path, max_size: u64) -> Result<(), SecurityError> {
    let metadata = match std::fs::metadata(file) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => {
            return Err(SecurityError::Io {
                path: file.to_path_buf(),
                error,
            })
        }
    };

    if metadata.len() > max_size {
        return Err(SecurityError::FileTooLarge {
            file: file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string()),
            max_size,
        });
    }

    Ok(())
}

fn absolutize(path: &Path) -> Result<PathBuf, SecurityError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|error| SecurityError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    Ok(cwd.join(path))
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
