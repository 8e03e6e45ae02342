//! File system utilities

use crate::error::{GitoliteError, Result};
use crate::system::System;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Create parent directories for a file path if they don't exist
///
/// # Errors
///
/// Returns a filesystem error if the directories cannot be created
pub fn create_parent_directories(system: &dyn System, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent()
        && !parent.as_os_str().is_empty()
    {
        system.create_dir_all(parent).map_err(|e| {
            GitoliteError::filesystem(format!(
                "Failed to create parent directories for {}: {e}",
                file_path.display()
            ))
        })?;
    }
    Ok(())
}

/// Remove a directory if it has no entries left
///
/// Never fails: a directory that still has entries is kept, and any other
/// error is logged. Returns whether the directory was removed.
pub fn remove_dir_if_empty(system: &dyn System, dir_path: &Path) -> bool {
    match system.remove_dir(dir_path) {
        Ok(()) => {
            debug!("Removed empty directory {}", dir_path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => false,
        Err(e) => {
            warn!("Could not remove directory {}: {e}", dir_path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::mock::MockSystem;

    #[test]
    fn create_parent_directories_builds_the_chain() {
        let system = MockSystem::new();
        create_parent_directories(&system, Path::new("/keydir/bob/laptop/bob.pub")).unwrap();
        assert!(system.is_dir(Path::new("/keydir/bob/laptop")).unwrap());
    }

    #[test]
    fn remove_dir_if_empty_keeps_populated_directories() {
        let system = MockSystem::new()
            .with_file("/keydir/bob/bob.pub", b"ssh-rsa AAAA bob")
            .unwrap()
            .with_dir("/keydir/empty")
            .unwrap();
        assert!(!remove_dir_if_empty(&system, Path::new("/keydir/bob")));
        assert!(remove_dir_if_empty(&system, Path::new("/keydir/empty")));
        assert!(!system.exists(Path::new("/keydir/empty")).unwrap());
        assert!(!remove_dir_if_empty(&system, Path::new("/keydir/missing")));
    }
}
