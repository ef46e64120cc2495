//! Search coordinator - drives one parallel search
//!
//! The coordinator is responsible for:
//! - Seeding the work queue with the root directory
//! - Starting the worker pool with the search handler
//! - Accepting exactly one match and cancelling the rest of the run
//! - Progress reporting
//! - Final statistics and the verdict
//!
//! When several branches contain a match, whichever worker reaches one
//! first wins. The reported path is therefore not deterministic across
//! runs; only the found/not-found verdict is.

use crate::config::{validate_threads, SearchConfig};
use crate::error::{ConfigError, ListResult, Result, ScanOutcome};
use crate::fs::DirLister;
use crate::walker::matcher::NameMatcher;
use crate::walker::pool::WorkerPool;
use crate::walker::queue::{DirTask, WorkQueue};
use crate::walker::signal::CancellationSignal;
use crate::walker::worker::{TaskFailure, TaskHandler};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// Full path of the accepted match
    Found(PathBuf),

    /// No entry matched (or the run was interrupted first)
    NotFound,
}

impl SearchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found(_))
    }

    /// Path of the match, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            SearchResult::Found(path) => Some(path),
            SearchResult::NotFound => None,
        }
    }
}

/// Result of a completed search
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// The verdict
    pub result: SearchResult,

    /// Directories successfully listed
    pub dirs_visited: u64,

    /// Entries inspected across all listings
    pub entries_seen: u64,

    /// Tasks executed by the pool
    pub tasks_processed: u64,

    /// Directories that could not be scanned
    pub failures: Vec<TaskFailure>,

    /// Pushes refused because the run was already cancelled
    pub rejected_pushes: u64,

    /// Queued directories dropped unscanned on cancellation
    pub discarded: u64,

    /// Worker threads used
    pub threads: usize,

    /// Time taken for the search
    pub duration: Duration,

    /// Cancelled from outside before a match or exhaustion
    pub interrupted: bool,
}

/// Live counters shared by the handler and the progress thread
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Directories listed
    pub dirs_listed: AtomicU64,

    /// Entries inspected
    pub entries_seen: AtomicU64,

    /// Listings that failed
    pub errors: AtomicU64,
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct SearchProgress {
    /// Directories listed
    pub dirs: u64,

    /// Entries inspected
    pub entries: u64,

    /// Failed listings
    pub errors: u64,

    /// Directories waiting in the queue
    pub queue_len: usize,

    /// Directories currently being scanned
    pub active: usize,

    /// Total workers
    pub threads: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl SearchProgress {
    /// Calculate dirs per second rate
    pub fn dirs_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.dirs as f64 / secs
        } else {
            0.0
        }
    }
}

/// Per-directory work: list, match, push children
struct SearchHandler<L> {
    lister: Arc<L>,
    matcher: NameMatcher,
    config: Arc<SearchConfig>,

    /// Written at most once
    result: OnceLock<PathBuf>,

    /// Identities of directories already queued
    visited: Mutex<HashSet<PathBuf>>,

    stats: Arc<SearchStats>,
}

impl<L: DirLister> SearchHandler<L> {
    /// Record `path` as queued; false if its identity was seen before
    fn first_visit(&self, path: &Path) -> bool {
        match self.lister.identity(path) {
            Some(id) => self.visited.lock().insert(id),
            None => true,
        }
    }

    fn should_descend(&self, child: &DirTask) -> bool {
        if !self.config.within_depth(child.depth) {
            return false;
        }
        if self.config.is_excluded(&child.path) {
            debug!(path = %child.path.display(), "Excluded");
            return false;
        }
        if !self.first_visit(&child.path) {
            debug!(path = %child.path.display(), "Already visited, skipping cycle");
            return false;
        }
        true
    }
}

impl<L: DirLister + 'static> TaskHandler for SearchHandler<L> {
    fn handle(
        &self,
        task: &DirTask,
        queue: &WorkQueue,
        signal: &CancellationSignal,
    ) -> ListResult<ScanOutcome> {
        if signal.is_cancelled() {
            return Ok(ScanOutcome::Skipped {
                reason: "cancelled".into(),
            });
        }

        let entries = match self.lister.list_entries(&task.path) {
            Ok(entries) => entries,
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.stats.dirs_listed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .entries_seen
            .fetch_add(entries.len() as u64, Ordering::Relaxed);

        let mut subdirs = 0;
        for entry in &entries {
            if entry.is_special() {
                continue;
            }

            // A listing that completes after cancellation is discarded
            if signal.is_cancelled() {
                return Ok(ScanOutcome::Skipped {
                    reason: "cancelled mid-scan".into(),
                });
            }

            let full_path = task.path.join(entry.name());

            if self.matcher.matches(entry) {
                if self.result.set(full_path.clone()).is_ok() {
                    info!(path = %full_path.display(), "Match found");
                    signal.cancel();
                    return Ok(ScanOutcome::Matched { path: full_path });
                }
                return Ok(ScanOutcome::Skipped {
                    reason: "another match was accepted first".into(),
                });
            }

            if entry.is_dir() {
                let child = task.child(full_path);
                if self.should_descend(&child) && queue.push(child) {
                    subdirs += 1;
                }
            }
        }

        Ok(ScanOutcome::Scanned {
            entries: entries.len(),
            subdirs,
        })
    }
}

/// Coordinates parallel searches over one directory lister
pub struct SearchCoordinator<L> {
    /// Configuration
    config: Arc<SearchConfig>,

    /// Directory listing collaborator
    lister: Arc<L>,
}

impl<L: DirLister + 'static> SearchCoordinator<L> {
    /// Create a new search coordinator
    pub fn new(config: SearchConfig, lister: L) -> Self {
        Self {
            config: Arc::new(config),
            lister: Arc::new(lister),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Get the lister
    pub fn lister(&self) -> &L {
        &self.lister
    }

    /// Search the configured root for the configured target
    pub fn search_configured(&self, signal: CancellationSignal) -> Result<SearchReport> {
        let target = self.configured_target()?;
        self.search_with_signal(&self.config.root, target, signal)
    }

    /// Like [`search_configured`](Self::search_configured), with progress
    pub fn search_configured_with_progress<F>(
        &self,
        signal: CancellationSignal,
        progress_callback: F,
    ) -> Result<SearchReport>
    where
        F: Fn(SearchProgress) + Send + 'static,
    {
        let target = self.configured_target()?;
        self.search_with_progress(&self.config.root, target, signal, progress_callback)
    }

    fn configured_target(&self) -> Result<&str> {
        self.config.target.as_deref().ok_or_else(|| {
            ConfigError::InvalidTarget {
                name: String::new(),
                reason: "no target name configured".into(),
            }
            .into()
        })
    }

    /// Search `root` for an entry named `target`
    pub fn search(&self, root: &Path, target: &str) -> Result<SearchReport> {
        self.search_with_signal(root, target, CancellationSignal::new())
    }

    /// Search with a caller-provided cancellation signal
    ///
    /// Firing `signal` from another thread (an interrupt handler) stops
    /// the run; the report then has `interrupted` set.
    pub fn search_with_signal(
        &self,
        root: &Path,
        target: &str,
        signal: CancellationSignal,
    ) -> Result<SearchReport> {
        self.run(root, target, signal, None::<fn(SearchProgress)>)
    }

    /// Search, invoking `progress_callback` every 100ms while running
    pub fn search_with_progress<F>(
        &self,
        root: &Path,
        target: &str,
        signal: CancellationSignal,
        progress_callback: F,
    ) -> Result<SearchReport>
    where
        F: Fn(SearchProgress) + Send + 'static,
    {
        self.run(root, target, signal, Some(progress_callback))
    }

    fn run<F>(
        &self,
        root: &Path,
        target: &str,
        signal: CancellationSignal,
        progress_callback: Option<F>,
    ) -> Result<SearchReport>
    where
        F: Fn(SearchProgress) + Send + 'static,
    {
        let start = Instant::now();
        validate_threads(self.config.threads)?;
        let matcher = NameMatcher::new(target, self.config.match_mode, self.config.case_sensitive)?;

        info!(
            root = %root.display(),
            name = %target,
            mode = ?matcher.mode(),
            threads = self.config.threads,
            "Starting search"
        );

        let stats = Arc::new(SearchStats::default());
        let handler = Arc::new(SearchHandler {
            lister: Arc::clone(&self.lister),
            matcher,
            config: Arc::clone(&self.config),
            result: OnceLock::new(),
            visited: Mutex::new(HashSet::new()),
            stats: Arc::clone(&stats),
        });

        // Seed the queue with the root directory
        let queue = Arc::new(WorkQueue::new(signal));
        handler.first_visit(root);
        queue.seed(root);

        let mut pool = WorkerPool::new(self.config.threads, self.config.grace, Arc::clone(&queue));
        pool.start(Arc::clone(&handler))?;

        let progress = progress_callback.and_then(|callback| {
            self.spawn_progress(callback, start, Arc::clone(&stats), Arc::clone(&queue))
        });

        // Wait for a match, exhaustion or interrupt, then stop workers
        let waited = pool.wait();
        let exhausted = queue.is_exhausted();

        if let Some((done, handle)) = progress {
            done.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }

        let pool_report = waited?;

        let result = match handler.result.get() {
            Some(path) => SearchResult::Found(path.clone()),
            None => SearchResult::NotFound,
        };
        let interrupted = !result.is_found() && !exhausted;
        let duration = start.elapsed();

        let report = SearchReport {
            result,
            dirs_visited: stats.dirs_listed.load(Ordering::Relaxed),
            entries_seen: stats.entries_seen.load(Ordering::Relaxed),
            tasks_processed: pool_report.tasks_processed,
            failures: pool_report.failures,
            rejected_pushes: queue.stats().rejected_count(),
            discarded: queue.stats().discarded_count(),
            threads: self.config.threads,
            duration,
            interrupted,
        };

        if report.interrupted {
            warn!("Search was interrupted before completion");
        }

        info!(
            found = report.result.is_found(),
            dirs = report.dirs_visited,
            errors = report.failures.len(),
            duration_ms = duration.as_millis() as u64,
            "Search finished"
        );

        Ok(report)
    }

    fn spawn_progress<F>(
        &self,
        callback: F,
        start: Instant,
        stats: Arc<SearchStats>,
        queue: Arc<WorkQueue>,
    ) -> Option<(Arc<AtomicBool>, thread::JoinHandle<()>)>
    where
        F: Fn(SearchProgress) + Send + 'static,
    {
        let done = Arc::new(AtomicBool::new(false));
        let done_clone = Arc::clone(&done);
        let threads = self.config.threads;

        let spawned = thread::Builder::new()
            .name("search-progress".to_string())
            .spawn(move || {
                while !done_clone.load(Ordering::Relaxed) {
                    callback(SearchProgress {
                        dirs: stats.dirs_listed.load(Ordering::Relaxed),
                        entries: stats.entries_seen.load(Ordering::Relaxed),
                        errors: stats.errors.load(Ordering::Relaxed),
                        queue_len: queue.len(),
                        active: queue.in_flight(),
                        threads,
                        elapsed: start.elapsed(),
                    });
                    thread::sleep(Duration::from_millis(100));
                }
            });

        match spawned {
            Ok(handle) => Some((done, handle)),
            Err(e) => {
                warn!(error = %e, "Failed to spawn progress thread");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::fs::MemoryTree;

    fn scenario() -> MemoryTree {
        MemoryTree::new("/a")
            .with_file("/a/b/target.txt")
            .with_dir("/a/c/d/e")
    }

    #[test]
    fn test_search_progress_rates() {
        let progress = SearchProgress {
            dirs: 1000,
            entries: 10000,
            errors: 5,
            queue_len: 500,
            active: 4,
            threads: 8,
            elapsed: Duration::from_secs(10),
        };

        assert!((progress.dirs_per_second() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_search_result_accessors() {
        let found = SearchResult::Found(PathBuf::from("/a/b"));
        assert!(found.is_found());
        assert_eq!(found.path(), Some(Path::new("/a/b")));
        assert_eq!(SearchResult::NotFound.path(), None);
    }

    #[test]
    fn test_finds_single_match() {
        let config = SearchConfig::new("/a")
            .with_threads(2)
            .with_match_mode(crate::config::MatchMode::Files);

        let coordinator = SearchCoordinator::new(config, scenario());
        let report = coordinator.search(Path::new("/a"), "target.txt").unwrap();

        assert_eq!(
            report.result,
            SearchResult::Found(PathBuf::from("/a/b/target.txt"))
        );
        assert!(!report.interrupted);
    }

    #[test]
    fn test_depth_bound_prunes() {
        let tree = MemoryTree::new("/a").with_file("/a/b/c/deep.txt");

        let shallow = SearchCoordinator::new(SearchConfig::new("/a").with_max_depth(1), tree);
        let report = shallow.search(Path::new("/a"), "deep.txt").unwrap();
        assert_eq!(report.result, SearchResult::NotFound);
        assert_eq!(shallow.lister().listings("/a/b/c"), 0);
        assert_eq!(report.dirs_visited, 2);
    }

    #[test]
    fn test_invalid_thread_cap_rejected_before_start() {
        let coordinator = SearchCoordinator::new(
            SearchConfig::new("/a").with_threads(0),
            MemoryTree::new("/a").with_dir("/a/x"),
        );
        let err = coordinator.search(Path::new("/a"), "x").unwrap_err();

        assert!(matches!(
            err,
            SearchError::Config(ConfigError::InvalidThreadCap { count: 0, .. })
        ));
        assert_eq!(coordinator.lister().total_listings(), 0);
    }

    #[test]
    fn test_search_configured_uses_config() {
        let config = SearchConfig::new("/a")
            .with_target("target.txt")
            .with_threads(2);
        let coordinator = SearchCoordinator::new(config, scenario());
        let report = coordinator
            .search_configured(CancellationSignal::new())
            .unwrap();
        assert_eq!(
            report.result,
            SearchResult::Found(PathBuf::from("/a/b/target.txt"))
        );

        let untargeted = SearchCoordinator::new(SearchConfig::new("/a"), scenario());
        assert!(matches!(
            untargeted.search_configured(CancellationSignal::new()),
            Err(SearchError::Config(ConfigError::InvalidTarget { .. }))
        ));
        assert_eq!(untargeted.lister().total_listings(), 0);
    }

    #[test]
    fn test_invalid_target_rejected_before_start() {
        let coordinator = SearchCoordinator::new(SearchConfig::new("/a"), MemoryTree::new("/a"));
        assert!(coordinator.search(Path::new("/a"), "").is_err());
        assert_eq!(coordinator.lister().total_listings(), 0);
    }

    #[test]
    fn test_progress_callback_runs() {
        let tree = MemoryTree::new("/a")
            .with_dir("/a/b/c")
            .with_delay(Duration::from_millis(60));
        let coordinator = SearchCoordinator::new(SearchConfig::new("/a").with_threads(1), tree);

        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let report = coordinator
            .search_with_progress(Path::new("/a"), "nope", CancellationSignal::new(), move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(report.result, SearchResult::NotFound);
        assert!(calls.load(Ordering::Relaxed) >= 1);
    }
}
