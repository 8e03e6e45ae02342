//! Permission tokens accepted in repo rules

use crate::error::GitoliteError;
use core::fmt;
use core::str::FromStr;
use serde::Serialize;

/// A validated gitolite permission token such as `R`, `RW+` or `-`
///
/// Valid tokens are `-`, `C`, `R`, and `RW` followed by an optional `+`,
/// an optional `C`/`D` pair in either order and an optional `M`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Deny rule
    pub const DENY: &'static str = "-";

    /// Check a token against the permission grammar without allocating
    #[must_use]
    pub fn is_valid(token: &str) -> bool {
        match token {
            "-" | "C" | "R" => true,
            _ => token.strip_prefix("RW").is_some_and(|rest| {
                let rest = rest.strip_prefix('+').unwrap_or(rest);
                let rest = rest.strip_suffix('M').unwrap_or(rest);
                matches!(rest, "" | "C" | "D" | "CD" | "DC")
            }),
        }
    }

    /// The token as written in gitolite.conf
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the `-` deny rule
    #[must_use]
    pub fn is_deny(&self) -> bool {
        self.0 == Self::DENY
    }
}

impl FromStr for Permission {
    type Err = GitoliteError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(token) {
            Ok(Self(token.to_owned()))
        } else {
            Err(GitoliteError::invalid_permission(token))
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
