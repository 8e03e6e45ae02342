//! gitolite.conf compiler
//!
//! Parses the gitolite configuration language into an in-memory model of
//! repos and groups, offers a mutation API over it and renders it back into
//! text that re-parses to the same model.

pub mod depgraph;
pub mod group;
pub mod parser;
pub mod permission;
pub mod render;
pub mod repo;

pub use group::Group;
pub use permission::Permission;
pub use repo::{PermissionBlock, RefRule, Repo};

use crate::error::{GitoliteError, Result};
use crate::system::System;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used by [`Config::init`]
pub const DEFAULT_CONFIG_FILE: &str = "gitolite.conf";

/// A repo given either by name or by an existing model instance
#[derive(Debug, Clone, Copy)]
pub enum RepoRef<'a> {
    Name(&'a str),
    Instance(&'a Repo),
}

impl<'a> RepoRef<'a> {
    /// The repo name this reference resolves to
    #[must_use]
    pub fn name(self) -> &'a str {
        match self {
            Self::Name(name) => name,
            Self::Instance(repo) => repo.name(),
        }
    }
}

impl<'a> From<&'a str> for RepoRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for RepoRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Repo> for RepoRef<'a> {
    fn from(repo: &'a Repo) -> Self {
        Self::Instance(repo)
    }
}

/// A group given either by name (with or without `@`) or by instance
#[derive(Debug, Clone, Copy)]
pub enum GroupRef<'a> {
    Name(&'a str),
    Instance(&'a Group),
}

impl<'a> GroupRef<'a> {
    /// The group name this reference resolves to, without its sigil
    #[must_use]
    pub fn name(self) -> &'a str {
        match self {
            Self::Name(name) => group::strip_sigil(name),
            Self::Instance(group) => group.name(),
        }
    }
}

impl<'a> From<&'a str> for GroupRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for GroupRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a Group> for GroupRef<'a> {
    fn from(group: &'a Group) -> Self {
        Self::Instance(group)
    }
}

/// A whole gitolite.conf: repos, groups and the file name it is saved under
///
/// Repos and groups live in separate namespaces; the same name may appear in
/// both. Both maps are keyed by name, so repos always render sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    filename: String,
    groups: BTreeMap<String, Group>,
    repos: BTreeMap<String, Repo>,
}

impl Config {
    /// Empty config saved as `filename`
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            groups: BTreeMap::new(),
            repos: BTreeMap::new(),
        }
    }

    /// Empty config saved as `gitolite.conf`
    #[must_use]
    pub fn init() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }

    /// Parse gitolite.conf text
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::Parse`] for the first line that cannot be
    /// compiled. Nothing of the partially built model is returned.
    pub fn parse(text: &str, filename: impl Into<String>) -> Result<Self> {
        let mut config = Self::new(filename);
        parser::parse_into(&mut config, text)?;
        Ok(config)
    }

    /// Load and parse a config file
    ///
    /// A missing file yields an empty config named after the file.
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the file exists but cannot be read, or a
    /// parse error if its contents are malformed
    pub fn load_from_file(system: &dyn System, path: &Path) -> Result<Self> {
        let filename = path.file_name().map_or_else(
            || DEFAULT_CONFIG_FILE.to_owned(),
            |name| name.to_string_lossy().into_owned(),
        );

        let exists = system.exists(path).map_err(|e| {
            GitoliteError::filesystem(format!("Failed to check {}: {e}", path.display()))
        })?;
        if !exists {
            debug!("Config file {} not found, starting empty", path.display());
            return Ok(Self::new(filename));
        }

        let text = system.read_to_string(path).map_err(|e| {
            GitoliteError::filesystem(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&text, filename)
    }

    /// Name of the file this config is saved as
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Repos in name order
    pub fn repos(&self) -> impl Iterator<Item = &Repo> {
        self.repos.values()
    }

    /// Groups in name order
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Insert `repo`, replacing any repo of the same name
    ///
    /// Returns the replaced repo.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the repo name is empty
    pub fn add_repo(&mut self, repo: Repo) -> Result<Option<Repo>> {
        if repo.name().is_empty() {
            return Err(GitoliteError::argument("repo name must not be empty"));
        }
        Ok(self.repos.insert(repo.name().to_owned(), repo))
    }

    pub fn rm_repo<'r>(&mut self, repo: impl Into<RepoRef<'r>>) -> Option<Repo> {
        self.repos.remove(repo.into().name())
    }

    #[must_use]
    pub fn has_repo<'r>(&self, repo: impl Into<RepoRef<'r>>) -> bool {
        self.repos.contains_key(repo.into().name())
    }

    #[must_use]
    pub fn get_repo<'r>(&self, repo: impl Into<RepoRef<'r>>) -> Option<&Repo> {
        self.repos.get(repo.into().name())
    }

    pub fn get_repo_mut<'r>(&mut self, repo: impl Into<RepoRef<'r>>) -> Option<&mut Repo> {
        self.repos.get_mut(repo.into().name())
    }

    /// Insert `group`, replacing any group of the same name
    ///
    /// Returns the replaced group.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the group name is empty
    pub fn add_group(&mut self, group: Group) -> Result<Option<Group>> {
        if group.name().is_empty() {
            return Err(GitoliteError::argument("group name must not be empty"));
        }
        Ok(self.groups.insert(group.name().to_owned(), group))
    }

    pub fn rm_group<'g>(&mut self, group: impl Into<GroupRef<'g>>) -> Option<Group> {
        self.groups.remove(group.into().name())
    }

    #[must_use]
    pub fn has_group<'g>(&self, group: impl Into<GroupRef<'g>>) -> bool {
        self.groups.contains_key(group.into().name())
    }

    #[must_use]
    pub fn get_group<'g>(&self, group: impl Into<GroupRef<'g>>) -> Option<&Group> {
        self.groups.get(group.into().name())
    }

    pub fn get_group_mut<'g>(&mut self, group: impl Into<GroupRef<'g>>) -> Option<&mut Group> {
        self.groups.get_mut(group.into().name())
    }

    /// Gitweb lines of every repo with a description, in repo name order
    #[must_use]
    pub fn gitweb_descriptions(&self) -> Vec<String> {
        self.repos
            .values()
            .filter_map(Repo::gitweb_description)
            .collect()
    }

    /// Groups ordered so each one follows every group it references
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::GroupDependency`] on cyclic membership or a
    /// reference to an undefined group
    pub fn group_order(&self) -> Result<Vec<&Group>> {
        depgraph::resolve(&self.groups)
    }

    /// Render the config as gitolite.conf text
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::GroupDependency`] if the groups cannot be
    /// ordered, or [`GitoliteError::Argument`] if a repo has a rule without
    /// users or an option without a value
    pub fn render(&self) -> Result<String> {
        render::render(self)
    }

    /// Write the rendered config to `dir/<filename>`, creating `dir`
    ///
    /// The text is rendered before anything touches the filesystem, so a
    /// dependency error never leaves a partial file behind.
    ///
    /// # Errors
    ///
    /// Returns a group dependency error, or a filesystem error if the
    /// directory or file cannot be written
    pub fn to_file(&self, system: &dyn System, dir: &Path) -> Result<PathBuf> {
        let text = self.render()?;

        system.create_dir_all(dir).map_err(|e| {
            GitoliteError::filesystem(format!("Failed to create {}: {e}", dir.display()))
        })?;

        let path = dir.join(&self.filename);
        system.write(&path, text.as_bytes()).map_err(|e| {
            GitoliteError::filesystem(format!("Failed to write {}: {e}", path.display()))
        })?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }

    pub(crate) fn repo_entry(&mut self, name: &str) -> &mut Repo {
        self.repos
            .entry(name.to_owned())
            .or_insert_with(|| Repo::new(name))
    }

    pub(crate) fn group_entry(&mut self, name: &str) -> &mut Group {
        self.groups
            .entry(name.to_owned())
            .or_insert_with(|| Group::new(name))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::init()
    }
}
