//! A single SSH public key and where it lives in the key directory
//!
//! gitolite names a user after the key file: `<keydir>/<owner>/<owner>.pub`.
//! A user with several keys gets one subdirectory per key location:
//! `<keydir>/<owner>/<location>/<owner>.pub`.

use crate::error::{GitoliteError, Result};
use crate::system::System;
use crate::utils::fs::{create_parent_directories, remove_dir_if_empty};
use crate::utils::path::validate_path_component;
use core::fmt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of key files in the key directory
pub const KEY_EXTENSION: &str = "pub";

/// An SSH public key owned by a gitolite user
///
/// Two keys are equal when owner, location, type, blob and email all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SshKey {
    owner: String,
    location: String,
    #[serde(rename = "type")]
    key_type: String,
    blob: String,
    email: String,
}

impl SshKey {
    /// Build a key from its parts
    ///
    /// `owner` defaults to `email` when not given.
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::InvalidKey`] if the type or blob is empty, or
    /// an argument error if the owner is empty or the owner or location is
    /// not a plain path segment
    pub fn new(
        key_type: impl Into<String>,
        blob: impl Into<String>,
        email: impl Into<String>,
        owner: Option<String>,
        location: impl Into<String>,
    ) -> Result<Self> {
        let key_type = key_type.into();
        let blob = blob.into();
        let email = email.into();
        let owner = owner.unwrap_or_else(|| email.clone());
        let location = location.into();

        if key_type.is_empty() || blob.is_empty() {
            return Err(GitoliteError::invalid_key(
                "a key needs both a type and a key blob",
            ));
        }
        if owner.is_empty() {
            return Err(GitoliteError::argument("key owner must not be empty"));
        }
        validate_path_component("key owner", &owner)?;
        if !location.is_empty() {
            validate_path_component("key location", &location)?;
        }

        Ok(Self {
            owner,
            location,
            key_type,
            blob,
            email,
        })
    }

    /// Parse `type blob [email]` key text
    ///
    /// The email is the third whitespace-separated field and defaults to
    /// `owner` when absent. Anything after it is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::InvalidKey`] if the type or blob is missing
    pub fn from_string(text: &str, owner: &str, location: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        let (Some(key_type), Some(blob)) = (parts.next(), parts.next()) else {
            return Err(GitoliteError::invalid_key(format!(
                "key for '{owner}' must contain a type and a key blob"
            )));
        };

        let email = parts.next().unwrap_or(owner);

        Self::new(key_type, blob, email, Some(owner.to_owned()), location)
    }

    /// Load a key file, deriving owner and location from its path
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the file cannot be read, or an invalid
    /// key error if the path has no file name or the text is malformed
    pub fn from_file(system: &dyn System, path: &Path) -> Result<Self> {
        let owner = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| {
                GitoliteError::invalid_key(format!("{} has no file name", path.display()))
            })?;
        let location = Self::location_from_path(path, &owner);

        let text = system.read_to_string(path).map_err(|e| {
            GitoliteError::filesystem(format!("Failed to read key {}: {e}", path.display()))
        })?;
        Self::from_string(&text, &owner, &location)
    }

    /// The location segment of a key path, or `""`
    ///
    /// `.../bob/laptop/bob.pub` has location `laptop` because the grandparent
    /// directory is named after the owner; `.../bob/bob.pub` has none.
    #[must_use]
    pub fn location_from_path(path: &Path, owner: &str) -> String {
        let Some(parent) = path.parent() else {
            return String::new();
        };
        let grandparent_is_owner = parent
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == owner);

        if grandparent_is_owner {
            parent
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    #[must_use]
    pub fn blob(&self) -> &str {
        &self.blob
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// `<owner>.pub`
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{}.{KEY_EXTENSION}", self.owner)
    }

    /// Path of the key file relative to the key directory
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.owner);
        if !self.location.is_empty() {
            path.push(&self.location);
        }
        path.push(self.filename());
        path
    }

    /// Write the key below `keydir`, creating directories as needed
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directories or the file cannot be
    /// written
    pub fn to_file(&self, system: &dyn System, keydir: &Path) -> Result<PathBuf> {
        let path = keydir.join(self.relative_path());
        create_parent_directories(system, &path)?;
        system
            .write(&path, format!("{self}\n").as_bytes())
            .map_err(|e| {
                GitoliteError::filesystem(format!("Failed to write key {}: {e}", path.display()))
            })?;
        debug!("Wrote key {}", path.display());
        Ok(path)
    }

    /// Delete this key's file below `keydir`
    ///
    /// See [`remove_key_file`] for the directory cleanup.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the key file cannot be deleted
    pub fn remove(&self, system: &dyn System, keydir: &Path) -> Result<PathBuf> {
        remove_key_file(system, keydir, &self.relative_path())
    }
}

/// Delete the key file at `relative` below `keydir`
///
/// Works for any layout, flat `bob.pub` as well as `bob/laptop/bob.pub`.
/// Directories between the file and `keydir` are removed bottom-up while
/// they are left empty; `keydir` itself is kept. Failing to remove a
/// directory is only logged.
///
/// # Errors
///
/// Returns a filesystem error if the key file cannot be deleted
pub fn remove_key_file(system: &dyn System, keydir: &Path, relative: &Path) -> Result<PathBuf> {
    let path = keydir.join(relative);
    system.remove_file(&path).map_err(|e| {
        GitoliteError::filesystem(format!("Failed to remove key {}: {e}", path.display()))
    })?;
    debug!("Removed key {}", path.display());

    let mut dir = path.parent();
    while let Some(current) = dir
        && current != keydir
        && current.starts_with(keydir)
        && remove_dir_if_empty(system, current)
    {
        dir = current.parent();
    }

    Ok(path)
}

impl fmt::Display for SshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key_type, self.blob, self.email)
    }
}
