//! Exclusive advisory lock serializing admin-repo transactions
//!
//! The lock is an OS-level `flock` on a file inside the working copy. It is
//! released when the guard is dropped, including on early returns and
//! panics.

use crate::error::GitoliteError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Held exclusive lock on a transaction lock file
#[derive(Debug)]
pub struct TransactionLock {
    path: PathBuf,
    file: Option<File>,
}

impl TransactionLock {
    /// Block until the lock on `path` is acquired
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::Lock`] if the lock file cannot be created or
    /// locked
    pub fn acquire(path: &Path) -> Result<Self, GitoliteError> {
        let file = open_lock_file(path)?;
        file.lock_exclusive().map_err(|e| {
            GitoliteError::lock(format!("Failed to lock {}: {e}", path.display()))
        })?;
        debug!("Acquired transaction lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Take the lock only if nobody else holds it
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::Lock`] on I/O errors other than contention
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, GitoliteError> {
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                path: path.to_path_buf(),
                file: Some(file),
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(GitoliteError::lock(format!(
                "Failed to lock {}: {e}",
                path.display()
            ))),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Release the lock before the guard goes out of scope
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::Lock`] if unlocking fails
    pub fn release(&mut self) -> Result<(), GitoliteError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| {
                GitoliteError::lock(format!("Failed to unlock {}: {e}", self.path.display()))
            })?;
            debug!("Released transaction lock {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for TransactionLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

fn open_lock_file(path: &Path) -> Result<File, GitoliteError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            GitoliteError::lock(format!("Failed to create {}: {e}", parent.display()))
        })?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| GitoliteError::lock(format!("Failed to open {}: {e}", path.display())))
}
