//! Serialization of a [`Config`] back into gitolite.conf text
//!
//! Layout: group lines in dependency order, a blank line before each repo
//! block (repos sorted by name), then a blank line and the gitweb lines.

use super::Config;
use crate::error::Result;

/// Render `config` as gitolite.conf text
///
/// # Errors
///
/// Returns [`GitoliteError::GroupDependency`](crate::error::GitoliteError::GroupDependency)
/// if the groups cannot be ordered, or
/// [`GitoliteError::Argument`](crate::error::GitoliteError::Argument) if a
/// repo holds a rule or option that has no gitolite.conf form
pub fn render(config: &Config) -> Result<String> {
    let mut out = String::new();

    for group in config.group_order()? {
        out.push_str(&group.to_string());
    }

    for repo in config.repos() {
        repo.validate()?;
        out.push('\n');
        out.push_str(&repo.to_string());
    }

    out.push('\n');
    for line in config.gitweb_descriptions() {
        out.push_str(&line);
        out.push('\n');
    }

    Ok(out)
}
