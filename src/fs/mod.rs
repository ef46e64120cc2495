//! Directory listing collaborators
//!
//! The search never touches the filesystem directly. Every listing goes
//! through a [`DirLister`], which keeps the walker testable against
//! in-memory trees with injected faults.
//!
//! # Example
//!
//! ```no_run
//! use treefind::fs::{DirLister, LocalFs};
//! use std::path::Path;
//!
//! let fs = LocalFs::new(false);
//! for entry in fs.list_entries(Path::new("/tmp")).unwrap() {
//!     println!("{:?}: {:?}", entry.name, entry.entry_type);
//! }
//! ```

pub mod local;
pub mod memory;
pub mod types;

use crate::error::ListResult;
use std::path::{Path, PathBuf};

pub use local::LocalFs;
pub use memory::MemoryTree;
pub use types::{DirEntry, EntryType};

/// Lists the entries of one directory
///
/// Implementations must be shareable across worker threads. Errors are
/// per call and only cost the caller that directory's subtree.
pub trait DirLister: Send + Sync {
    /// List the entries of `path`, excluding "." and ".."
    fn list_entries(&self, path: &Path) -> ListResult<Vec<DirEntry>>;

    /// Stable identity of a directory, used to break link cycles
    ///
    /// Returning `None` disables cycle tracking for that directory.
    fn identity(&self, _path: &Path) -> Option<PathBuf> {
        None
    }
}

impl<T: DirLister + ?Sized> DirLister for std::sync::Arc<T> {
    fn list_entries(&self, path: &Path) -> ListResult<Vec<DirEntry>> {
        (**self).list_entries(path)
    }

    fn identity(&self, path: &Path) -> Option<PathBuf> {
        (**self).identity(path)
    }
}
