//! Lister backed by the local filesystem

use crate::error::{ListError, ListResult};
use crate::fs::types::{DirEntry, EntryType};
use crate::fs::DirLister;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Lists directories with `std::fs::read_dir`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs {
    /// Classify symlinks by their target instead of as links
    follow_links: bool,
}

impl LocalFs {
    pub fn new(follow_links: bool) -> Self {
        Self { follow_links }
    }

    fn classify(&self, entry: &fs::DirEntry) -> Result<EntryType, std::io::Error> {
        let ft = entry.file_type()?;
        if ft.is_symlink() && self.follow_links {
            // Dangling links stay links
            return Ok(match fs::metadata(entry.path()) {
                Ok(meta) => EntryType::from_file_type(meta.file_type()),
                Err(_) => EntryType::Symlink,
            });
        }
        Ok(EntryType::from_file_type(ft))
    }
}

impl DirLister for LocalFs {
    fn list_entries(&self, path: &Path) -> ListResult<Vec<DirEntry>> {
        let read_dir = fs::read_dir(path).map_err(|e| ListError::from_io(path, &e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| ListError::from_io(path, &e))?;
            let entry_type = match self.classify(&entry) {
                Ok(t) => t,
                Err(e) => {
                    // Entry vanished after readdir returned it
                    trace!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            entries.push(DirEntry::new(entry.file_name(), entry_type));
        }

        Ok(entries)
    }

    fn identity(&self, path: &Path) -> Option<PathBuf> {
        if self.follow_links {
            fs::canonicalize(path).ok()
        } else {
            None
        }
    }
}
