//! Repository access rules, git config and gitweb metadata

use super::permission::Permission;
use crate::error::{GitoliteError, Result};
use core::fmt;
use serde::Serialize;
use std::collections::BTreeMap;

/// Users granted one permission on one ref pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefRule {
    /// Ref pattern; empty means every ref
    pub refex: String,
    /// Users and `@group` references, in first-added order
    pub users: Vec<String>,
}

/// Every rule of a repo that uses the same permission token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionBlock {
    pub permission: Permission,
    /// Rules in first-seen order of their ref pattern
    pub rules: Vec<RefRule>,
}

impl PermissionBlock {
    fn new(permission: Permission) -> Self {
        Self {
            permission,
            rules: Vec::new(),
        }
    }

    /// Users listed for `refex`, if the pattern has been seen
    #[must_use]
    pub fn users(&self, refex: &str) -> Option<&[String]> {
        self.rules
            .iter()
            .find(|rule| rule.refex == refex)
            .map(|rule| rule.users.as_slice())
    }

    /// Number of distinct ref patterns in the block
    #[must_use]
    pub fn size(&self) -> usize {
        self.rules.len()
    }

    fn rule_mut(&mut self, refex: &str) -> &mut RefRule {
        let index = match self.rules.iter().position(|rule| rule.refex == refex) {
            Some(index) => index,
            None => {
                self.rules.push(RefRule {
                    refex: refex.to_owned(),
                    users: Vec::new(),
                });
                self.rules.len() - 1
            }
        };
        &mut self.rules[index]
    }
}

/// A repository (or repo pattern) declared in gitolite.conf
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repo {
    name: String,
    permissions: Vec<PermissionBlock>,
    #[serde(rename = "config")]
    git_config: BTreeMap<String, String>,
    options: BTreeMap<String, String>,
    owner: Option<String>,
    description: Option<String>,
}

impl Repo {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
            git_config: BTreeMap::new(),
            options: BTreeMap::new(),
            owner: None,
            description: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permission blocks in the order their tokens were first added
    #[must_use]
    pub fn permissions(&self) -> &[PermissionBlock] {
        &self.permissions
    }

    /// Block for a permission token, if one has been added
    #[must_use]
    pub fn permission(&self, token: &str) -> Option<&PermissionBlock> {
        self.permissions
            .iter()
            .find(|block| block.permission.as_str() == token)
    }

    /// Grant `token` on `refex` (empty for all refs) to `users`
    ///
    /// A token seen for the first time opens a new block at the end of the
    /// list; otherwise the users are appended to the existing block's rule
    /// for `refex`. Users already listed for that pair are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::InvalidPermission`](crate::error::GitoliteError::InvalidPermission)
    /// if `token` is not a valid permission
    pub fn add_permission<I, S>(&mut self, token: &str, refex: &str, users: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permission: Permission = token.parse()?;

        let index = match self
            .permissions
            .iter()
            .position(|block| block.permission == permission)
        {
            Some(index) => index,
            None => {
                self.permissions.push(PermissionBlock::new(permission));
                self.permissions.len() - 1
            }
        };

        let rule = self.permissions[index].rule_mut(refex);
        for user in users {
            let user = user.into();
            if !rule.users.contains(&user) {
                rule.users.push(user);
            }
        }

        Ok(self)
    }

    /// Repo-local git settings (`config key = value`)
    #[must_use]
    pub fn git_config(&self) -> &BTreeMap<String, String> {
        &self.git_config
    }

    /// Set a git config entry, returning the stored value
    pub fn set_git_config(&mut self, key: impl Into<String>, value: impl Into<String>) -> &str {
        let key = key.into();
        self.git_config.insert(key.clone(), value.into());
        self.git_config.get(&key).map_or("", String::as_str)
    }

    /// Remove a git config entry, returning its old value
    pub fn unset_git_config(&mut self, key: &str) -> Option<String> {
        self.git_config.remove(key)
    }

    /// Gitolite options (`option key = value`)
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Set a gitolite option, returning the stored value
    pub fn set_gitolite_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> &str {
        let key = key.into();
        self.options.insert(key.clone(), value.into());
        self.options.get(&key).map_or("", String::as_str)
    }

    /// Remove a gitolite option, returning its old value
    pub fn unset_gitolite_option(&mut self, key: &str) -> Option<String> {
        self.options.remove(key)
    }

    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// The gitweb line for this repo: `name ["owner"] = "description"`
    ///
    /// `None` when no description is set.
    #[must_use]
    pub fn gitweb_description(&self) -> Option<String> {
        let description = self.description.as_ref()?;
        Some(match self.owner.as_ref() {
            Some(owner) => format!("{} \"{owner}\" = \"{description}\"", self.name),
            None => format!("{} = \"{description}\"", self.name),
        })
    }

    /// Check that every rule and option can be written as gitolite.conf text
    ///
    /// # Errors
    ///
    /// Returns [`GitoliteError::Argument`] for a rule with no users or an
    /// option with an empty value; neither has a line that parses back
    pub fn validate(&self) -> Result<()> {
        for block in &self.permissions {
            if let Some(rule) = block.rules.iter().find(|rule| rule.users.is_empty()) {
                return Err(GitoliteError::argument(format!(
                    "repo {}: {} rule on '{}' has no users",
                    self.name,
                    block.permission.as_str(),
                    rule.refex
                )));
            }
        }

        if let Some((key, _)) = self.options.iter().find(|(_, value)| value.is_empty()) {
            return Err(GitoliteError::argument(format!(
                "repo {}: option {key} has no value",
                self.name
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Repo {
    /// Renders the `repo` header followed by rules, config and options
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "repo    {}", self.name)?;

        for block in &self.permissions {
            for rule in &block.rules {
                let refex = if rule.refex.is_empty() {
                    String::new()
                } else {
                    format!("{:<24} ", rule.refex)
                };
                writeln!(
                    f,
                    "  {:<7}{refex}= {}",
                    block.permission.as_str(),
                    rule.users.join(" ")
                )?;
            }
        }

        for (key, value) in &self.git_config {
            writeln!(f, "  config {key} = {value}")?;
        }

        for (key, value) in &self.options {
            writeln!(f, "  option {key} = {value}")?;
        }

        Ok(())
    }
}
