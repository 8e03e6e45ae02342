//! Named groups of users and nested groups

use core::fmt;
use serde::Serialize;
use std::collections::BTreeSet;

/// Prefix that marks a name as a group reference
pub const GROUP_SIGIL: char = '@';

/// Column the `=` of a rendered group line is aligned to
pub const GROUP_NAME_WIDTH: usize = 20;

/// Built-in group every gitolite install provides
pub const ALL_GROUP: &str = "all";

/// Strip one leading group sigil, if present
#[must_use]
pub fn strip_sigil(name: &str) -> &str {
    name.strip_prefix(GROUP_SIGIL).unwrap_or(name)
}

/// Whether a member token refers to another group
#[must_use]
pub fn is_group_reference(member: &str) -> bool {
    member.len() > 1 && member.starts_with(GROUP_SIGIL)
}

/// A gitolite group such as `@staff = alice bob @admins`
///
/// Members are kept deduplicated and in lexicographic order. A member may be
/// a user name or a reference to another group (`@name`); referenced groups
/// are looked up by name in the owning [`Config`](super::Config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    name: String,
    users: BTreeSet<String>,
}

impl Group {
    /// Create an empty group. A leading `@` in `name` is dropped.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: strip_sigil(name.as_ref()).to_owned(),
            users: BTreeSet::new(),
        }
    }

    /// Group name without its sigil
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in sorted order
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(String::as_str)
    }

    /// Add one member; returns `false` if it was already present
    pub fn add_user(&mut self, user: impl Into<String>) -> bool {
        self.users.insert(user.into())
    }

    /// Add several members at once, skipping duplicates
    pub fn add_users<I, S>(&mut self, users: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users.extend(users.into_iter().map(Into::into));
    }

    /// Remove a member; returns `true` if it was present
    pub fn rm_user(&mut self, user: &str) -> bool {
        self.users.remove(user)
    }

    #[must_use]
    pub fn has_user(&self, user: &str) -> bool {
        self.users.contains(user)
    }

    /// Drop every member
    pub fn clear(&mut self) {
        self.users.clear();
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Names of the groups this group references, without their sigil
    pub fn subgroups(&self) -> impl Iterator<Item = &str> {
        self.users
            .iter()
            .filter(|member| is_group_reference(member))
            .map(|member| strip_sigil(member))
    }
}

impl fmt::Display for Group {
    /// Renders `@name`, padded so `=` lands on [`GROUP_NAME_WIDTH`], then the
    /// members and a newline
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = format!("{GROUP_SIGIL}{}", self.name);
        let mut line = if label.len() < GROUP_NAME_WIDTH {
            format!("{label:<width$}= ", width = GROUP_NAME_WIDTH)
        } else {
            format!("{label} = ")
        };
        line.push_str(&self.users().collect::<Vec<_>>().join(" "));
        writeln!(f, "{}", line.trim_end())
    }
}
