//! Mock system implementation for testing

use super::{System, WalkEntry};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory implementation of System trait for testing
///
/// `MockSystem` keeps a tree of files and directories in memory, so config
/// and key-directory round trips can be tested without touching disk.
/// Clones share the same state.
///
/// # Example
/// ```
/// use gitolite_conf::system::{mock::MockSystem, System};
/// use std::path::Path;
///
/// let system = MockSystem::new()
///     .with_file("/admin/conf/gitolite.conf", b"repo foo\n  R = bob\n").unwrap()
///     .with_dir("/admin/keydir").unwrap();
///
/// assert!(system.exists(Path::new("/admin/conf")).unwrap());
/// assert!(system.is_dir(Path::new("/admin/keydir")).unwrap());
/// ```
#[derive(Clone)]
pub struct MockSystem {
    state: Arc<RwLock<MockSystemState>>,
}

struct MockSystemState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MockSystem {
    /// Create a new `MockSystem` containing only the root directory
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockSystemState {
                files: BTreeMap::new(),
                dirs: BTreeSet::from([PathBuf::from("/")]),
            })),
        }
    }

    /// Add a file with contents (builder pattern)
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory state lock is poisoned
    #[inline]
    pub fn with_file<P: AsRef<Path>>(self, path: P, contents: &[u8]) -> io::Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        {
            let mut state = self.write_state()?;
            if let Some(parent) = path_buf.parent() {
                Self::ensure_dirs(&mut state.dirs, parent);
            }
            state.files.insert(path_buf, contents.to_vec());
        }
        Ok(self)
    }

    /// Add a directory (builder pattern)
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory state lock is poisoned
    #[inline]
    pub fn with_dir<P: AsRef<Path>>(self, path: P) -> io::Result<Self> {
        {
            let mut state = self.write_state()?;
            Self::ensure_dirs(&mut state.dirs, path.as_ref());
        }
        Ok(self)
    }

    /// List every file currently stored, sorted by path
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory state lock is poisoned
    #[inline]
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        let state = self.read_state()?;
        Ok(state.files.keys().cloned().collect())
    }

    fn read_state(&self) -> io::Result<RwLockReadGuard<'_, MockSystemState>> {
        self.state
            .read()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn write_state(&self) -> io::Result<RwLockWriteGuard<'_, MockSystemState>> {
        self.state
            .write()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn ensure_dirs(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn not_found(kind: &str, path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{kind} not found: {}", path.display()),
        )
    }
}

impl Default for MockSystem {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl System for MockSystem {
    #[inline]
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = {
            let state = self.read_state()?;
            state
                .files
                .get(path)
                .cloned()
                .ok_or_else(|| Self::not_found("File", path))?
        };
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Invalid UTF-8: {e}")))
    }

    #[inline]
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut state = self.write_state()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !state.dirs.contains(parent)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Parent directory does not exist: {}", parent.display()),
            ));
        }

        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("Is a directory: {}", path.display()),
            ));
        }

        state.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    #[inline]
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("A file exists at: {}", path.display()),
            ));
        }
        Self::ensure_dirs(&mut state.dirs, path);
        Ok(())
    }

    #[inline]
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Self::not_found("File", path))
    }

    #[inline]
    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;

        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }

        let has_children = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .any(|p| p.parent() == Some(path));
        if has_children {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("Directory not empty: {}", path.display()),
            ));
        }

        state.dirs.remove(path);
        Ok(())
    }

    #[inline]
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.write_state()?;

        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }

        state.files.retain(|p, _| !p.starts_with(path));
        state.dirs.retain(|p| !p.starts_with(path));
        Ok(())
    }

    #[inline]
    fn exists(&self, path: &Path) -> io::Result<bool> {
        let state = self.read_state()?;
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    #[inline]
    fn is_file(&self, path: &Path) -> io::Result<bool> {
        let state = self.read_state()?;
        Ok(state.files.contains_key(path))
    }

    #[inline]
    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        let state = self.read_state()?;
        Ok(state.dirs.contains(path))
    }

    #[inline]
    fn walk_dir(&self, path: &Path) -> io::Result<Vec<WalkEntry>> {
        let state = self.read_state()?;

        if !state.dirs.contains(path) {
            return Err(Self::not_found("Directory", path));
        }

        let dirs = state
            .dirs
            .iter()
            .filter(|p| p.as_path() != path && p.starts_with(path))
            .map(|p| WalkEntry {
                path: p.clone(),
                is_file: false,
                is_dir: true,
            });
        let files = state
            .files
            .keys()
            .filter(|p| p.starts_with(path))
            .map(|p| WalkEntry {
                path: p.clone(),
                is_file: true,
                is_dir: false,
            });

        let mut entries: Vec<WalkEntry> = dirs.chain(files).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(entries)
    }
}
