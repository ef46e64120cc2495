//! Error types for treefind
//!
//! This module defines the error hierarchy for a search run:
//! - Directory listing errors (per task, recovered by skipping the subtree)
//! - Worker pool errors (spawn failures, stuck workers on shutdown)
//! - Configuration errors (rejected before any work starts)
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - Preserve error chains for debugging

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for a search
#[derive(Error, Debug)]
pub enum SearchError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker pool errors
    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    /// I/O errors (stdin prompt, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure to list a single directory
///
/// These never abort a search. The directory's subtree is skipped and the
/// failure is recorded in the final report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Permission denied
    #[error("Permission denied: '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Directory vanished between discovery and listing
    #[error("Path not found: '{path}'")]
    NotFound { path: PathBuf },

    /// Path exists but is not a directory
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Any other I/O failure
    #[error("Failed to read directory '{path}': {reason}")]
    Io { path: PathBuf, reason: String },
}

impl ListError {
    /// Classify an I/O error raised while listing `path`
    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        let path = path.to_path_buf();
        match err.kind() {
            io::ErrorKind::PermissionDenied => ListError::PermissionDenied { path },
            io::ErrorKind::NotFound => ListError::NotFound { path },
            io::ErrorKind::NotADirectory => ListError::NotADirectory { path },
            _ => ListError::Io {
                path,
                reason: err.to_string(),
            },
        }
    }

    /// Check if this error is expected during a normal walk
    ///
    /// Recoverable errors are logged at debug level, everything else at warn.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ListError::PermissionDenied { .. } | ListError::NotFound { .. }
        )
    }

    /// Returns the directory that failed to list
    pub fn path(&self) -> &Path {
        match self {
            ListError::PermissionDenied { path }
            | ListError::NotFound { path }
            | ListError::NotADirectory { path }
            | ListError::Io { path, .. } => path,
        }
    }
}

/// Configuration errors, raised before a search starts
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid thread cap
    #[error("Invalid thread count {count}: must be between 1 and {max}")]
    InvalidThreadCap { count: usize, max: usize },

    /// Root path is missing or not a directory
    #[error("Invalid root path '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Target name is empty or contains a separator
    #[error("Invalid target name '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Zero grace period would fail every shutdown
    #[error("Invalid shutdown grace period: must be at least one second")]
    InvalidGracePeriod,
}

/// Worker pool errors
///
/// A pool error means the pool could not be brought up or torn down
/// cleanly; the search result cannot be trusted and the process should exit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Failed to spawn a worker thread
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },

    /// Workers did not exit within the grace period
    #[error("{pending} worker(s) failed to stop within {grace:?} - a handler is stuck")]
    JoinTimeout { pending: usize, grace: Duration },

    /// Worker thread panicked outside of task handling
    #[error("Worker {id} panicked")]
    Panicked { id: usize },
}

/// Result type alias for SearchError
pub type Result<T> = std::result::Result<T, SearchError>;

/// Result type alias for ListError
pub type ListResult<T> = std::result::Result<T, ListError>;

/// Represents the outcome of scanning a single directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Directory listed; children pushed where allowed
    Scanned { entries: usize, subdirs: usize },

    /// An entry in this directory was accepted as the match
    Matched { path: PathBuf },

    /// Not listed (cancelled, excluded, too deep)
    Skipped { reason: String },
}
