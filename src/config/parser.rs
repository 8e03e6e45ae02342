//! Line-oriented compiler from gitolite.conf text to a [`Config`]
//!
//! Every raw line is cleaned up (comments dropped, `=` spaced, whitespace
//! collapsed) and then matched against an ordered set of rules. The first
//! rule that matches decides what the line means:
//!
//! 1. `repo <names...>`
//! 2. `<permission> [<refex> ]= <users...>`
//! 3. `config <key> = [<value>]`
//! 4. `option <key> = <value>`
//! 5. `@<group> = [<members...>]`
//! 6. `<repo> ["<owner>"] = "<description>"` (gitweb)
//! 7. `include "<path>"` / `subconf <name>` (accepted and ignored)
//!
//! A gitweb line without its quoted description, and anything else, aborts
//! the whole parse.

use super::Config;
use super::group::{GROUP_SIGIL, strip_sigil};
use super::permission::Permission;
use crate::error::{GitoliteError, Result};
use regex::Regex;
use tracing::{debug, warn};

/// Meaning of one cleaned-up config line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// `repo foo bar` - switches the current context
    Repo(Vec<&'a str>),
    /// `RW+ refs/heads/ = bob` - access rule for every repo in context
    Rule {
        permission: Permission,
        refex: &'a str,
        users: Vec<&'a str>,
    },
    /// `config key = value`
    GitConfig { key: &'a str, value: &'a str },
    /// `option key = value`
    GitoliteOption { key: &'a str, value: &'a str },
    /// `@name = members...`; `name` has no sigil
    Group { name: &'a str, members: Vec<&'a str> },
    /// `repo "owner" = "description"`
    Gitweb {
        repo: &'a str,
        owner: Option<&'a str>,
        description: &'a str,
    },
    /// `include "path"`
    Include(&'a str),
    /// `subconf name`
    Subconf(&'a str),
}

/// Strip a trailing comment and normalize spacing
///
/// A comment starts at the first `#` outside a double-quoted string. Every
/// `=` gets one space on each side, whitespace runs collapse to one space and
/// the result is trimmed. Pure comment lines come back empty.
#[must_use]
pub fn cleanup_config_line(raw: &str) -> String {
    let mut in_quotes = false;
    let mut end = raw.len();
    for (index, ch) in raw.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => {
                end = index;
                break;
            }
            _ => {}
        }
    }

    raw[..end]
        .replace('=', " = ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compiled line rules, tried in priority order
#[derive(Debug)]
pub struct Grammar {
    repo: Regex,
    rule: Regex,
    git_config: Regex,
    option: Regex,
    group: Regex,
    gitweb: Regex,
    gitweb_incomplete: Regex,
    include: Regex,
    subconf: Regex,
}

impl Grammar {
    /// Compile the line rules
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a rule fails to compile
    pub fn new() -> Result<Self> {
        Ok(Self {
            repo: compile(r"^repo (.+)$")?,
            rule: compile(r"^(\S+) (?:(.*) )?= (.+)$")?,
            git_config: compile(r"^config (.+) = ?(.*)$")?,
            option: compile(r"^option (.+) =(?: (.*))?$")?,
            group: compile(&format!(r"^{GROUP_SIGIL}(\S+) = ?(.*)$"))?,
            gitweb: compile(r#"^(\S+)(?: "(.*?)")? = "(.*)"$"#)?,
            gitweb_incomplete: compile(r#"^(\S+) (?:"(.*?)"(?: =)?|=)$"#)?,
            include: compile(r#"^include "(.+)""#)?,
            subconf: compile(r"^subconf (\S+)$")?,
        })
    }

    /// Classify one cleaned-up, non-empty line
    ///
    /// `number` is the 1-based source line used in error messages.
    ///
    /// # Errors
    ///
    /// Returns a parse error if no rule accepts the line, if an option has
    /// no value, or if a gitweb line lacks its description or names a group
    pub fn classify<'a>(&self, line: &'a str, number: usize) -> Result<Line<'a>> {
        if let Some(caps) = self.repo.captures(line) {
            let names = caps.get(1).map_or("", |m| m.as_str());
            return Ok(Line::Repo(names.split_whitespace().collect()));
        }

        if let Some(caps) = self.rule.captures(line)
            && let Some(token) = caps.get(1)
            && Permission::is_valid(token.as_str())
        {
            let permission = token.as_str().parse()?;
            return Ok(Line::Rule {
                permission,
                refex: caps.get(2).map_or("", |m| m.as_str()),
                users: caps
                    .get(3)
                    .map_or("", |m| m.as_str())
                    .split_whitespace()
                    .collect(),
            });
        }

        if let Some(caps) = self.git_config.captures(line) {
            return Ok(Line::GitConfig {
                key: caps.get(1).map_or("", |m| m.as_str()),
                value: caps.get(2).map_or("", |m| m.as_str()),
            });
        }

        if let Some(caps) = self.option.captures(line) {
            let key = caps.get(1).map_or("", |m| m.as_str());
            let value = caps
                .get(2)
                .map(|m| m.as_str())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    GitoliteError::parse(number, format!("missing option value for key '{key}'"))
                })?;
            return Ok(Line::GitoliteOption { key, value });
        }

        if let Some(caps) = self.group.captures(line) {
            return Ok(Line::Group {
                name: caps.get(1).map_or("", |m| m.as_str()),
                members: caps
                    .get(2)
                    .map_or("", |m| m.as_str())
                    .split_whitespace()
                    .collect(),
            });
        }

        if let Some(caps) = self.gitweb.captures(line) {
            let repo = caps.get(1).map_or("", |m| m.as_str());
            reject_group_gitweb(repo, number)?;
            return Ok(Line::Gitweb {
                repo,
                owner: caps.get(2).map(|m| m.as_str()),
                description: caps.get(3).map_or("", |m| m.as_str()),
            });
        }

        if let Some(caps) = self.include.captures(line) {
            return Ok(Line::Include(caps.get(1).map_or("", |m| m.as_str())));
        }

        if let Some(caps) = self.subconf.captures(line) {
            return Ok(Line::Subconf(caps.get(1).map_or("", |m| m.as_str())));
        }

        if let Some(caps) = self.gitweb_incomplete.captures(line) {
            let repo = caps.get(1).map_or("", |m| m.as_str());
            reject_group_gitweb(repo, number)?;
            return Err(GitoliteError::parse(
                number,
                format!("missing gitweb description for repo '{repo}'"),
            ));
        }

        Err(GitoliteError::parse(
            number,
            format!("'{line}' cannot be processed"),
        ))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        GitoliteError::configuration(format!("invalid line rule '{pattern}': {e}"))
    })
}

fn reject_group_gitweb(name: &str, number: usize) -> Result<()> {
    if name.starts_with(GROUP_SIGIL) {
        return Err(GitoliteError::parse(
            number,
            format!("gitweb descriptions cannot be set for groups ('{name}')"),
        ));
    }
    Ok(())
}

/// Compile `text` into `config`
///
/// The caller should hand in a fresh [`Config`] and drop it on error; a
/// failed parse leaves it partially filled.
///
/// # Errors
///
/// Returns the first parse error encountered
pub fn parse_into(config: &mut Config, text: &str) -> Result<()> {
    let grammar = Grammar::new()?;
    let mut context: Vec<String> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let cleaned = cleanup_config_line(raw);
        if cleaned.is_empty() {
            continue;
        }

        match grammar.classify(&cleaned, number)? {
            Line::Repo(names) => {
                context = names.iter().map(|name| (*name).to_owned()).collect();
                for name in names {
                    config.repo_entry(name);
                }
            }
            Line::Rule {
                permission,
                refex,
                users,
            } => {
                warn_without_context(&context, number);
                for name in &context {
                    config
                        .repo_entry(name)
                        .add_permission(permission.as_str(), refex, users.iter().copied())?;
                }
            }
            Line::GitConfig { key, value } => {
                warn_without_context(&context, number);
                for name in &context {
                    config.repo_entry(name).set_git_config(key, value);
                }
            }
            Line::GitoliteOption { key, value } => {
                warn_without_context(&context, number);
                for name in &context {
                    config.repo_entry(name).set_gitolite_option(key, value);
                }
            }
            Line::Group { name, members } => {
                config.group_entry(strip_sigil(name)).add_users(members);
            }
            Line::Gitweb {
                repo,
                owner,
                description,
            } => {
                let entry = config.repo_entry(repo);
                entry.set_owner(owner.map(str::to_owned));
                entry.set_description(Some(description.to_owned()));
            }
            Line::Include(path) => {
                debug!("Ignoring include directive at line {number}: {path}");
            }
            Line::Subconf(name) => {
                debug!("Ignoring subconf directive at line {number}: {name}");
            }
        }
    }

    Ok(())
}

fn warn_without_context(context: &[String], number: usize) {
    if context.is_empty() {
        warn!("Line {number} applies to no repo: no 'repo' line precedes it");
    }
}
