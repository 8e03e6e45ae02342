//! Working copy of a gitolite-admin repository
//!
//! [`GitoliteAdmin`] owns the parsed config and key store of one working
//! copy. Changes are written back with [`save`](GitoliteAdmin::save), which
//! commits them, and published with [`apply`](GitoliteAdmin::apply), which
//! pushes. [`transaction`](GitoliteAdmin::transaction) wraps a batch of
//! changes in an exclusive lock so concurrent callers on the same working
//! copy take turns.

pub mod git;
pub mod lock;
pub mod settings;

pub use git::GitCli;
pub use lock::TransactionLock;
pub use settings::AdminSettings;

use crate::config::Config;
use crate::keys::{KeyStore, SshKey, SyncReport};
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// An opened gitolite-admin working copy
pub struct GitoliteAdmin<'s> {
    path: PathBuf,
    settings: AdminSettings,
    system: &'s dyn System,
    git: GitCli,
    config: Config,
    keys: KeyStore,
}

impl<'s> GitoliteAdmin<'s> {
    /// Open the working copy at `path`, cloning it first if needed
    ///
    /// An existing working copy is updated from the remote when
    /// `update_on_init` is set. Config and keys are loaded afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if cloning or updating fails, or the config or keys
    /// cannot be loaded
    pub fn open(path: &Path, settings: AdminSettings, system: &'s dyn System) -> Result<Self> {
        let git = GitCli::new(path, settings.ssh_command());
        let mut admin = Self {
            path: path.to_path_buf(),
            settings,
            system,
            git,
            config: Config::init(),
            keys: KeyStore::new(),
        };

        if Self::is_gitolite_admin_repo(path, &admin.settings, system) {
            if admin.settings.update_on_init {
                admin.pull()?;
            }
        } else {
            let url = admin.settings.admin_url();
            info!("Cloning {url} into {}", path.display());
            admin
                .git
                .clone_from(&url, &admin.settings.remote_branch)
                .with_context(|| format!("Failed to open admin repo at {}", path.display()))?;
        }

        admin.reload()?;
        Ok(admin)
    }

    /// Whether `path` is a gitolite-admin working copy
    ///
    /// It must be a git work tree with at least one commit, a config
    /// directory holding the config file, and a key directory.
    #[must_use]
    pub fn is_gitolite_admin_repo(
        path: &Path,
        settings: &AdminSettings,
        system: &dyn System,
    ) -> bool {
        let layout_ok = system.is_dir(&settings.config_dir_path(path)).unwrap_or(false)
            && system.is_dir(&settings.key_dir_path(path)).unwrap_or(false)
            && system.is_file(&settings.config_file_path(path)).unwrap_or(false);
        if !layout_ok {
            return false;
        }

        let git = GitCli::new(path, None);
        git.is_work_tree() && git.has_commits()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[must_use]
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut KeyStore {
        &mut self.keys
    }

    /// Add a key; returns `false` if it was already present
    pub fn add_key(&mut self, key: SshKey) -> bool {
        self.keys.add_key(key)
    }

    /// Remove a key; returns `true` if it was present
    pub fn rm_key(&mut self, key: &SshKey) -> bool {
        self.keys.rm_key(key)
    }

    /// Re-read the config file and the key directory, dropping unsaved
    /// changes
    ///
    /// # Errors
    ///
    /// Returns an error if either cannot be loaded
    pub fn reload(&mut self) -> Result<()> {
        let config_path = self.settings.config_file_path(&self.path);
        self.config = Config::load_from_file(self.system, &config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        let key_dir = self.settings.managed_key_dir_path(&self.path);
        self.keys = KeyStore::load(self.system, &key_dir)
            .with_context(|| format!("Failed to load keys from {}", key_dir.display()))?;

        debug!(
            "Loaded {} repos, {} groups and {} keys",
            self.config.repos().count(),
            self.config.groups().count(),
            self.keys.len()
        );
        Ok(())
    }

    /// Write config and keys and commit them
    ///
    /// Uses the configured commit message unless `message` is given.
    /// Returns `false` when there was nothing to commit.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, writing, staging or committing fails.
    /// Nothing is committed in that case.
    pub fn save(&mut self, message: Option<&str>) -> Result<bool> {
        let config_dir = self.settings.config_dir_path(&self.path);
        self.config
            .to_file(self.system, &config_dir)
            .context("Failed to write gitolite config")?;

        let key_dir = self.settings.managed_key_dir_path(&self.path);
        let report: SyncReport = self
            .keys
            .sync(self.system, &key_dir)
            .context("Failed to write keys")?;
        debug!(
            "Keys: {} written, {} removed",
            report.written.len(),
            report.removed.len()
        );

        let mut staged: Vec<&Path> = Vec::new();
        for relative in [&self.settings.config_dir, &self.settings.key_dir] {
            if self.system.exists(&self.path.join(relative))? {
                staged.push(Path::new(relative.as_str()));
            }
        }
        self.git.add_all(&staged)?;

        if !self.git.has_staged_changes()? {
            debug!("Nothing to commit");
            return Ok(false);
        }

        let message = message.unwrap_or(self.settings.commit_msg.as_str());
        self.git.commit(
            message,
            &self.settings.author_name,
            &self.settings.author_email,
        )?;
        info!("Committed: {message}");
        Ok(true)
    }

    /// Push the local branch to the remote
    ///
    /// # Errors
    ///
    /// Returns a git error if the push fails
    pub fn apply(&self) -> Result<()> {
        self.git.push(&self.settings.local_branch)?;
        info!("Pushed {}", self.settings.local_branch);
        Ok(())
    }

    /// [`save`](Self::save) followed by [`apply`](Self::apply)
    ///
    /// # Errors
    ///
    /// Returns the first error of either step
    pub fn save_and_apply(&mut self, message: Option<&str>) -> Result<bool> {
        let committed = self.save(message)?;
        self.apply()?;
        Ok(committed)
    }

    /// Discard local commits and changes, then reload
    ///
    /// # Errors
    ///
    /// Returns an error if the reset or the reload fails
    pub fn reset(&mut self) -> Result<()> {
        self.git.reset_hard(&self.settings.remote_branch)?;
        self.reload()
    }

    /// Bring the working copy up to date with the remote, then reload
    ///
    /// # Errors
    ///
    /// Returns an error if resetting, fetching, merging or reloading fails
    pub fn update(&mut self) -> Result<()> {
        self.pull()?;
        self.reload()
    }

    /// Delete the working copy from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed
    pub fn clean_up(self) -> Result<()> {
        self.system
            .remove_dir_all(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        info!("Removed working copy {}", self.path.display());
        Ok(())
    }

    /// Run `changes` under the transaction lock, then push
    ///
    /// The lock is held until the push finishes. If `changes` fails nothing
    /// is pushed, the working copy is reset to the remote branch and the
    /// error is returned. The lock is released either way.
    /// `changes` is expected to call [`save`](Self::save) itself.
    ///
    /// # Errors
    ///
    /// Returns a lock error, the error of `changes`, or a push error
    pub fn transaction<T, F>(&mut self, changes: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let lock_path = self.path.join(&self.settings.lock_file_path);
        let mut lock = TransactionLock::acquire(&lock_path)?;

        let value = match changes(self) {
            Ok(value) => value,
            Err(err) => {
                if let Err(reset_err) = self.reset() {
                    warn!("Failed to discard aborted transaction: {reset_err:#}");
                }
                return Err(err);
            }
        };
        self.apply()?;

        lock.release()?;
        Ok(value)
    }

    fn pull(&self) -> Result<()> {
        if self.settings.reset_before_update {
            self.git.reset_hard(&self.settings.remote_branch)?;
        }
        self.git.fetch()?;
        self.git.merge_remote(&self.settings.remote_branch)?;
        debug!("Updated {} from origin", self.path.display());
        Ok(())
    }
}
