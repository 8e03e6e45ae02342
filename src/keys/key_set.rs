//! Keys of one owner with change tracking

use super::ssh_key::SshKey;

/// The keys of one owner, remembering whether they changed since the last
/// [`mark_clean`](Self::mark_clean)
///
/// Only dirty sets are written back to the key directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: Vec<SshKey>,
    dirty: bool,
}

impl KeySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; returns `false` (and stays clean) if it is already present
    pub fn push(&mut self, key: SshKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        self.dirty = true;
        true
    }

    /// Remove a key; returns `true` if it was present
    pub fn remove(&mut self, key: &SshKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|existing| existing != key);
        let removed = self.keys.len() != before;
        self.dirty |= removed;
        removed
    }

    /// Drop every key
    pub fn clear(&mut self) {
        if !self.keys.is_empty() {
            self.keys.clear();
            self.dirty = true;
        }
    }

    #[must_use]
    pub fn contains(&self, key: &SshKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SshKey> {
        self.keys.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a SshKey;
    type IntoIter = core::slice::Iter<'a, SshKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
