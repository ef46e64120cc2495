//! treefind - Parallel Filesystem Search
//!
//! Searches a directory tree for an entry with a given name, spreading
//! directory listing across a bounded pool of worker threads and stopping
//! all outstanding work as soon as any worker finds a match.
//!
//! # Features
//!
//! - **Real Parallel Traversal**: Every directory is a task on a shared
//!   work queue; workers push the subdirectories they discover.
//!
//! - **Early Termination**: The first accepted match fires a cancellation
//!   signal that drains the queue and wakes every idle worker.
//!
//! - **Exact Termination Detection**: The queue tracks in-flight tasks, so
//!   a momentarily empty queue is never mistaken for the end of the walk.
//!
//! - **Fault Tolerant**: Unreadable directories are skipped and recorded;
//!   they never abort the search.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SearchCoordinator                          │
//! │          seed root ─▶ start pool ─▶ wait ─▶ read result         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Worker Threads                              │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       └────────────┼────────────┼────────────────────┘          │
//! │                    ▼            ▼                               │
//! │            ┌──────────────────────────┐                         │
//! │            │     Work Queue           │◀── CancellationSignal   │
//! │            │  - FIFO + in-flight      │                         │
//! │            └──────────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────┐
//!                    │    DirLister     │
//!                    │ (local / memory) │
//!                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Prompt for the name, search the current directory
//! treefind
//!
//! # Search a tree for a file, four threads
//! treefind /srv -n config.toml -m files -t 4
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod progress;
pub mod walker;

pub use config::{CliArgs, MatchMode, SearchConfig};
pub use error::{Result, SearchError};
pub use walker::{SearchCoordinator, SearchReport, SearchResult};
