//! Settings of the gitolite-admin working copy

use crate::error::GitoliteError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How to reach, lay out and commit to a gitolite-admin repository
///
/// Every field has a default, so a settings file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// SSH user gitolite runs as
    pub git_user: String,
    /// Host serving the admin repo
    pub hostname: String,
    /// Full clone URL; overrides `git_user`/`hostname` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    pub author_name: String,
    pub author_email: String,
    /// Default commit message for `save`
    pub commit_msg: String,
    pub config_dir: String,
    pub key_dir: String,
    /// Extra directory level below `key_dir` for managed keys
    pub key_subdir: String,
    pub config_file: String,
    /// Lock file, relative to the working copy
    pub lock_file_path: String,
    pub local_branch: String,
    pub remote_branch: String,
    /// Fetch and merge the remote when opening an existing working copy
    pub update_on_init: bool,
    /// Hard reset before every update
    pub reset_before_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<PathBuf>,
}

impl Default for AdminSettings {
    fn default() -> Self {
        let ssh_dir = dirs::home_dir().map(|home| home.join(".ssh"));
        Self {
            git_user: "git".to_owned(),
            hostname: "localhost".to_owned(),
            remote_url: None,
            author_name: "gitolite-conf".to_owned(),
            author_email: "gitolite-conf@localhost".to_owned(),
            commit_msg: "Update gitolite configuration".to_owned(),
            config_dir: "conf".to_owned(),
            key_dir: "keydir".to_owned(),
            key_subdir: String::new(),
            config_file: "gitolite.conf".to_owned(),
            lock_file_path: ".lock".to_owned(),
            local_branch: "master".to_owned(),
            remote_branch: "master".to_owned(),
            update_on_init: true,
            reset_before_update: true,
            public_key: ssh_dir.as_ref().map(|dir| dir.join("id_rsa.pub")),
            private_key: ssh_dir.map(|dir| dir.join("id_rsa")),
        }
    }
}

impl AdminSettings {
    /// Load settings from a YAML file
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing, and a context
    /// error if it cannot be read or parsed
    pub fn load_from_file(system: &dyn System, path: &Path) -> Result<Self> {
        if !system.exists(path)? {
            return Err(GitoliteError::configuration(format!(
                "Settings file not found: {}",
                path.display()
            ))
            .into());
        }

        let content = system
            .read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// URL the admin repo is cloned from
    #[must_use]
    pub fn admin_url(&self) -> String {
        self.remote_url.clone().unwrap_or_else(|| {
            format!(
                "ssh://{}@{}/gitolite-admin.git",
                self.git_user, self.hostname
            )
        })
    }

    /// Config directory inside the working copy
    #[must_use]
    pub fn config_dir_path(&self, root: &Path) -> PathBuf {
        root.join(&self.config_dir)
    }

    /// Config file inside the working copy
    #[must_use]
    pub fn config_file_path(&self, root: &Path) -> PathBuf {
        self.config_dir_path(root).join(&self.config_file)
    }

    /// Key directory inside the working copy
    #[must_use]
    pub fn key_dir_path(&self, root: &Path) -> PathBuf {
        root.join(&self.key_dir)
    }

    /// Directory managed keys are stored in
    #[must_use]
    pub fn managed_key_dir_path(&self, root: &Path) -> PathBuf {
        let key_dir = self.key_dir_path(root);
        if self.key_subdir.is_empty() {
            key_dir
        } else {
            key_dir.join(&self.key_subdir)
        }
    }

    /// `GIT_SSH_COMMAND` selecting the configured private key
    #[must_use]
    pub fn ssh_command(&self) -> Option<String> {
        self.private_key
            .as_ref()
            .map(|key| format!("ssh -i '{}' -o IdentitiesOnly=yes", key.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::mock::MockSystem;

    #[test]
    fn default_admin_url() {
        let settings = AdminSettings::default();
        assert_eq!(settings.admin_url(), "ssh://git@localhost/gitolite-admin.git");
    }

    #[test]
    fn remote_url_overrides_derived_url() {
        let settings = AdminSettings {
            remote_url: Some("/srv/git/gitolite-admin.git".to_owned()),
            ..AdminSettings::default()
        };
        assert_eq!(settings.admin_url(), "/srv/git/gitolite-admin.git");
    }

    #[test]
    fn load_merges_with_defaults() {
        let system = MockSystem::new()
            .with_file(
                "/etc/gitolite-conf.yaml",
                b"hostname: git.example.com\nkey_subdir: managed\nupdate_on_init: false\n",
            )
            .unwrap();
        let settings =
            AdminSettings::load_from_file(&system, Path::new("/etc/gitolite-conf.yaml")).unwrap();

        assert_eq!(settings.hostname, "git.example.com");
        assert_eq!(settings.git_user, "git");
        assert!(!settings.update_on_init);
        assert_eq!(
            settings.managed_key_dir_path(Path::new("/admin")),
            PathBuf::from("/admin/keydir/managed")
        );
        assert_eq!(
            settings.config_file_path(Path::new("/admin")),
            PathBuf::from("/admin/conf/gitolite.conf")
        );
    }

    #[test]
    fn load_missing_file_is_a_configuration_error() {
        let err = AdminSettings::load_from_file(&MockSystem::new(), Path::new("/missing.yaml"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitoliteError>(),
            Some(GitoliteError::Configuration { .. })
        ));
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let system = MockSystem::new()
            .with_file("/bad.yaml", b"hostname: [unclosed\n")
            .unwrap();
        assert!(AdminSettings::load_from_file(&system, Path::new("/bad.yaml")).is_err());
    }
}
