//! In-memory directory tree
//!
//! Exercises the walker against trees that would be awkward to build on
//! disk: unreadable directories, link cycles and slow listings.

use crate::error::{ListError, ListResult};
use crate::fs::types::{DirEntry, EntryType};
use crate::fs::DirLister;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// A directory tree held entirely in memory
///
/// ```
/// use treefind::fs::{DirLister, MemoryTree};
/// use std::path::Path;
///
/// let tree = MemoryTree::new("/a")
///     .with_file("/a/b/target.txt")
///     .with_dir("/a/c/d/e");
///
/// assert_eq!(tree.directory_count(), 5);
/// assert_eq!(tree.list_entries(Path::new("/a")).unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct MemoryTree {
    root: PathBuf,

    /// Directory path -> children
    dirs: BTreeMap<PathBuf, BTreeMap<OsString, EntryType>>,

    /// Link path -> target directory
    links: HashMap<PathBuf, PathBuf>,

    /// Directories whose listing fails
    faults: HashMap<PathBuf, ListError>,

    /// Artificial latency per listing
    delay: Option<Duration>,

    /// Listing calls per requested path
    listings: Mutex<HashMap<PathBuf, usize>>,
}

impl MemoryTree {
    /// Create a tree containing only an empty root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut dirs = BTreeMap::new();
        dirs.insert(root.clone(), BTreeMap::new());

        Self {
            root,
            dirs,
            links: HashMap::new(),
            faults: HashMap::new(),
            delay: None,
            listings: Mutex::new(HashMap::new()),
        }
    }

    /// Root directory of the tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a directory and any missing ancestors
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.insert_dir(path.as_ref());
        self
    }

    /// Add a file and any missing ancestor directories
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.insert_dir(parent);
            if let Some(children) = self.dirs.get_mut(parent) {
                children.insert(name.to_os_string(), EntryType::File);
            }
        }
        self
    }

    /// Add a directory link at `path` pointing at `target`
    ///
    /// The link lists as a directory, so links back up the tree form cycles.
    pub fn with_link(mut self, path: impl AsRef<Path>, target: impl Into<PathBuf>) -> Self {
        let path = path.as_ref();
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.insert_dir(parent);
            if let Some(children) = self.dirs.get_mut(parent) {
                children.insert(name.to_os_string(), EntryType::Directory);
            }
            self.links.insert(path.to_path_buf(), target.into());
        }
        self
    }

    /// Make listing `path` fail with `error`
    pub fn with_fault(mut self, path: impl Into<PathBuf>, error: ListError) -> Self {
        self.faults.insert(path.into(), error);
        self
    }

    /// Sleep for `delay` inside every listing
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of real directories (links excluded)
    pub fn directory_count(&self) -> usize {
        self.dirs.len()
    }

    /// How many times `path` has been listed
    pub fn listings(&self, path: impl AsRef<Path>) -> usize {
        self.listings.lock().get(path.as_ref()).copied().unwrap_or(0)
    }

    /// Total listing calls across all paths
    pub fn total_listings(&self) -> usize {
        self.listings.lock().values().sum()
    }

    /// Number of distinct paths listed at least once
    pub fn distinct_listings(&self) -> usize {
        self.listings.lock().len()
    }

    fn insert_dir(&mut self, path: &Path) {
        if self.dirs.contains_key(path) {
            return;
        }
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if path != self.root {
                self.insert_dir(parent);
                if let Some(children) = self.dirs.get_mut(parent) {
                    children.insert(name.to_os_string(), EntryType::Directory);
                }
            }
        }
        self.dirs.insert(path.to_path_buf(), BTreeMap::new());
    }

    /// Resolve every link prefix of `path`
    fn resolve(&self, path: &Path) -> PathBuf {
        let mut resolved = PathBuf::new();
        for component in path.components() {
            resolved.push(component);
            // Bounded so a link to itself cannot spin forever
            let mut hops = 0;
            while let Some(target) = self.links.get(&resolved) {
                resolved = target.clone();
                hops += 1;
                if hops > 32 {
                    break;
                }
            }
        }
        resolved
    }
}

impl DirLister for MemoryTree {
    fn list_entries(&self, path: &Path) -> ListResult<Vec<DirEntry>> {
        *self.listings.lock().entry(path.to_path_buf()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        if let Some(fault) = self.faults.get(path) {
            return Err(fault.clone());
        }

        let resolved = self.resolve(path);
        match self.dirs.get(&resolved) {
            Some(children) => Ok(children
                .iter()
                .map(|(name, entry_type)| DirEntry::new(name.clone(), *entry_type))
                .collect()),
            None => {
                let is_file = resolved
                    .parent()
                    .and_then(|parent| self.dirs.get(parent))
                    .zip(resolved.file_name())
                    .is_some_and(|(children, name)| children.contains_key(name));
                if is_file {
                    Err(ListError::NotADirectory {
                        path: path.to_path_buf(),
                    })
                } else {
                    Err(ListError::NotFound {
                        path: path.to_path_buf(),
                    })
                }
            }
        }
    }

    fn identity(&self, path: &Path) -> Option<PathBuf> {
        Some(self.resolve(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_ancestors() {
        let tree = MemoryTree::new("/a").with_file("/a/b/c/file.txt");

        assert_eq!(tree.directory_count(), 3);
        let entries = tree.list_entries(Path::new("/a/b")).unwrap();
        assert_eq!(entries, vec![DirEntry::dir("c")]);
        let entries = tree.list_entries(Path::new("/a/b/c")).unwrap();
        assert_eq!(entries, vec![DirEntry::file("file.txt")]);
    }

    #[test]
    fn test_fault_and_missing() {
        let tree = MemoryTree::new("/a").with_dir("/a/c").with_fault(
            "/a/c",
            ListError::PermissionDenied {
                path: "/a/c".into(),
            },
        );

        assert!(matches!(
            tree.list_entries(Path::new("/a/c")),
            Err(ListError::PermissionDenied { .. })
        ));
        assert!(matches!(
            tree.list_entries(Path::new("/a/zzz")),
            Err(ListError::NotFound { .. })
        ));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let tree = MemoryTree::new("/a").with_file("/a/f");
        assert!(matches!(
            tree.list_entries(Path::new("/a/f")),
            Err(ListError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_link_resolves_to_target() {
        let tree = MemoryTree::new("/a")
            .with_file("/a/b/x")
            .with_link("/a/b/up", "/a");

        let via_link = tree.list_entries(Path::new("/a/b/up/b")).unwrap();
        assert_eq!(via_link, vec![DirEntry::dir("up"), DirEntry::file("x")]);
        assert_eq!(
            tree.identity(Path::new("/a/b/up/b")),
            Some(PathBuf::from("/a/b"))
        );
    }

    #[test]
    fn test_listing_counters() {
        let tree = MemoryTree::new("/a").with_dir("/a/b");
        tree.list_entries(Path::new("/a")).unwrap();
        tree.list_entries(Path::new("/a")).unwrap();
        tree.list_entries(Path::new("/a/b")).unwrap();

        assert_eq!(tree.listings("/a"), 2);
        assert_eq!(tree.total_listings(), 3);
        assert_eq!(tree.distinct_listings(), 2);
    }
}
