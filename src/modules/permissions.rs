//! Owner-only creation of module artifacts

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

/// rwx------ for directories and scripts
pub const PRIVATE_EXEC_MODE: u32 = 0o700;
/// rw------- for data files
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Create a single directory readable only by its owner.
///
/// Fails if anything already exists at `path`.
pub fn create_private_dir(path: &Path) -> io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(PRIVATE_EXEC_MODE);
    }

    builder.create(path)?;
    restrict_to_owner(path, true);
    Ok(())
}

/// Write a new file with owner-only permissions.
///
/// Uses `create_new`, so an existing file or a planted symlink is never
/// followed or overwritten.
pub fn write_private_file(path: &Path, contents: &[u8], executable: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(if executable {
            PRIVATE_EXEC_MODE
        } else {
            PRIVATE_FILE_MODE
        });
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    restrict_to_owner(path, executable);
    Ok(())
}

/// Reset permissions to owner-only. Failures are logged, not raised.
pub fn restrict_to_owner(path: &Path, executable: bool) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if executable {
            PRIVATE_EXEC_MODE
        } else {
            PRIVATE_FILE_MODE
        };
        match std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
            Ok(()) => debug!("Set secure permissions {:o} on {}", mode, path.display()),
            Err(e) => warn!("Failed to set permissions on {}: {}", path.display(), e),
        }
    }

    #[cfg(not(unix))]
    {
        // No POSIX modes here; ACLs inherited from the user profile apply
        let _ = executable;
        debug!("Skipping permission change on {}", path.display());
    }
}
