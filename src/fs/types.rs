//! Directory entry types returned by listers

use std::ffi::{OsStr, OsString};

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (not followed)
    Symlink,
    /// Device, socket, fifo or anything else
    Other,
}

impl EntryType {
    /// Classify a `std::fs::FileType`
    pub fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_dir() {
            EntryType::Directory
        } else if ft.is_file() {
            EntryType::File
        } else if ft.is_symlink() {
            EntryType::Symlink
        } else {
            EntryType::Other
        }
    }

    /// Check if this is a directory
    pub fn is_dir(&self) -> bool {
        *self == EntryType::Directory
    }

    /// Check if this is anything other than a directory
    ///
    /// Symlinks that are not followed count as files for matching.
    pub fn is_file_like(&self) -> bool {
        !self.is_dir()
    }
}

/// A single entry in a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (no path components)
    pub name: OsString,

    /// Entry type
    pub entry_type: EntryType,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, entry_type: EntryType) -> Self {
        Self {
            name: name.into(),
            entry_type,
        }
    }

    pub fn file(name: impl Into<OsString>) -> Self {
        Self::new(name, EntryType::File)
    }

    pub fn dir(name: impl Into<OsString>) -> Self {
        Self::new(name, EntryType::Directory)
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type.is_dir()
    }

    /// Check if this is "." or ".."
    pub fn is_special(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}
