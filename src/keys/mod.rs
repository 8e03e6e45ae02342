//! SSH public keys kept in the gitolite key directory
//!
//! [`KeyStore`] mirrors the `keydir/` tree of an admin repo: one
//! [`KeySet`] per owner. [`KeyStore::sync`] writes the sets that changed and
//! deletes files for keys that are gone.

pub mod key_set;
pub mod ssh_key;

pub use key_set::KeySet;
pub use ssh_key::{KEY_EXTENSION, SshKey, remove_key_file};

use crate::error::{GitoliteError, Result};
use crate::system::System;
use crate::utils::path::has_extension;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files touched by [`KeyStore::sync`], relative to the key directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl SyncReport {
    /// Whether the key directory was left untouched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Every key of every owner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    sets: BTreeMap<String, KeySet>,
}

impl KeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.pub` file below `keydir`
    ///
    /// A missing key directory yields an empty store. Every loaded set starts
    /// clean.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directory cannot be walked or a key
    /// cannot be read, or an invalid key error for a malformed key file
    pub fn load(system: &dyn System, keydir: &Path) -> Result<Self> {
        let mut store = Self::new();
        for path in key_files(system, keydir)? {
            store.add_key(SshKey::from_file(system, &path)?);
        }
        for set in store.sets.values_mut() {
            set.mark_clean();
        }
        debug!(
            "Loaded {} keys for {} owners from {}",
            store.len(),
            store.sets.len(),
            keydir.display()
        );
        Ok(store)
    }

    /// Add a key to its owner's set; returns `false` if it was already there
    pub fn add_key(&mut self, key: SshKey) -> bool {
        self.sets.entry(key.owner().to_owned()).or_default().push(key)
    }

    /// Remove a key from its owner's set; returns `true` if it was present
    pub fn rm_key(&mut self, key: &SshKey) -> bool {
        self.sets
            .get_mut(key.owner())
            .is_some_and(|set| set.remove(key))
    }

    /// Keys of one owner
    #[must_use]
    pub fn keys_of(&self, owner: &str) -> Option<&KeySet> {
        self.sets.get(owner)
    }

    /// Owners that have a key set, in name order
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// Every key, grouped by owner in name order
    pub fn iter(&self) -> impl Iterator<Item = &SshKey> {
        self.sets.values().flat_map(KeySet::iter)
    }

    #[must_use]
    pub fn contains(&self, key: &SshKey) -> bool {
        self.sets
            .get(key.owner())
            .is_some_and(|set| set.contains(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.values().map(KeySet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any owner's keys changed since the last load or sync
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.sets.values().any(KeySet::is_dirty)
    }

    /// Bring `keydir` in line with the store
    ///
    /// A key file on disk is deleted, at the path it was found under, when
    /// its key is no longer in the store. It is also deleted when its owner's
    /// set is dirty and the file is not at the key's
    /// [`relative_path`](SshKey::relative_path), where the set is rewritten.
    /// Then every key of every dirty set is written. All sets are clean
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns a filesystem or invalid key error from reading, deleting or
    /// writing key files
    pub fn sync(&mut self, system: &dyn System, keydir: &Path) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        for path in key_files(system, keydir)? {
            let on_disk = SshKey::from_file(system, &path)?;
            let relative = path
                .strip_prefix(keydir)
                .map_or_else(|_| path.clone(), Path::to_path_buf);

            let keep = self.sets.get(on_disk.owner()).is_some_and(|set| {
                set.contains(&on_disk) && (!set.is_dirty() || relative == on_disk.relative_path())
            });
            if !keep {
                remove_key_file(system, keydir, &relative)?;
                report.removed.push(relative);
            }
        }

        for set in self.sets.values_mut() {
            if !set.is_dirty() {
                continue;
            }
            for key in set.iter() {
                key.to_file(system, keydir)?;
                report.written.push(key.relative_path());
            }
            set.mark_clean();
        }

        debug!(
            "Key sync: {} written, {} removed",
            report.written.len(),
            report.removed.len()
        );
        Ok(report)
    }
}

/// Paths of every `*.pub` file below `keydir`, sorted
fn key_files(system: &dyn System, keydir: &Path) -> Result<Vec<PathBuf>> {
    let exists = system.is_dir(keydir).map_err(|e| {
        GitoliteError::filesystem(format!("Failed to inspect {}: {e}", keydir.display()))
    })?;
    if !exists {
        return Ok(Vec::new());
    }

    let entries = system.walk_dir(keydir).map_err(|e| {
        GitoliteError::filesystem(format!("Failed to walk {}: {e}", keydir.display()))
    })?;

    Ok(entries
        .into_iter()
        .filter(|entry| entry.is_file && has_extension(&entry.path, KEY_EXTENSION))
        .map(|entry| entry.path)
        .collect())
}
