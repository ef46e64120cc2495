//! Worker thread logic for the search pool
//!
//! Each worker:
//! - Pulls directory tasks from the shared work queue
//! - Hands each task to the pool's [`TaskHandler`]
//! - Records per-task failures without dying
//! - Exits when the queue reports end of work

use crate::error::{ListError, ListResult, PoolError, ScanOutcome};
use crate::walker::queue::{DirTask, Popped, WorkQueue};
use crate::walker::signal::CancellationSignal;
use crossbeam_channel::Sender;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

/// Work executed for every dequeued directory
///
/// Handlers push discovered subdirectories back into `queue`. Returning
/// an error costs only this task; the worker moves on.
pub trait TaskHandler: Send + Sync + 'static {
    fn handle(
        &self,
        task: &DirTask,
        queue: &WorkQueue,
        signal: &CancellationSignal,
    ) -> ListResult<ScanOutcome>;
}

impl<F> TaskHandler for F
where
    F: Fn(&DirTask, &WorkQueue, &CancellationSignal) -> ListResult<ScanOutcome>
        + Send
        + Sync
        + 'static,
{
    fn handle(
        &self,
        task: &DirTask,
        queue: &WorkQueue,
        signal: &CancellationSignal,
    ) -> ListResult<ScanOutcome> {
        self(task, queue, signal)
    }
}

/// A task that did not complete normally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// Directory could not be listed
    List(ListError),

    /// Handler panicked
    Panicked { path: PathBuf, message: String },
}

impl TaskFailure {
    /// Returns the directory the failed task was scanning
    pub fn path(&self) -> &Path {
        match self {
            TaskFailure::List(err) => err.path(),
            TaskFailure::Panicked { path, .. } => path,
        }
    }
}

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks handed to the handler
    pub tasks_processed: AtomicU64,

    /// Tasks that returned an error
    pub errors: AtomicU64,

    /// Tasks whose handler panicked
    pub panics: AtomicU64,
}

impl WorkerStats {
    fn record_task(&self) {
        self.tasks_processed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }
}

/// A worker thread that processes directory tasks
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    ///
    /// `exited` receives the worker's id when its loop ends, whether the
    /// loop returned or unwound.
    pub fn spawn<H: TaskHandler>(
        id: usize,
        queue: Arc<WorkQueue>,
        handler: Arc<H>,
        failures: Sender<TaskFailure>,
        exited: Sender<usize>,
    ) -> Result<Self, PoolError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name(format!("search-{}", id))
            .spawn(move || {
                let _notice = ExitNotice { id, exited };
                worker_loop(id, &queue, handler.as_ref(), &failures, &stats_clone);
            })
            .map_err(|e| PoolError::SpawnFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), PoolError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| PoolError::Panicked { id: self.id }),
            None => Ok(()),
        }
    }

    /// Give up on the thread without joining it
    pub(crate) fn detach(mut self) {
        self.handle.take();
    }
}

/// Reports worker exit on drop
struct ExitNotice {
    id: usize,
    exited: Sender<usize>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.exited.send(self.id);
    }
}

/// Main worker loop
fn worker_loop<H: TaskHandler + ?Sized>(
    id: usize,
    queue: &WorkQueue,
    handler: &H,
    failures: &Sender<TaskFailure>,
    stats: &WorkerStats,
) {
    debug!(worker = id, "Worker starting");
    let signal = queue.signal().clone();

    loop {
        let task = match queue.pop() {
            Popped::Task(task) => task,
            Popped::EndOfWork => break,
        };

        stats.record_task();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.handle(&task, queue, &signal)
        }));

        match outcome {
            Ok(Ok(ScanOutcome::Scanned { entries, subdirs })) => {
                trace!(worker = id, path = %task.path.display(), entries, subdirs, "Directory scanned");
            }
            Ok(Ok(ScanOutcome::Matched { path })) => {
                debug!(worker = id, path = %path.display(), "Match reported");
            }
            Ok(Ok(ScanOutcome::Skipped { reason })) => {
                trace!(worker = id, path = %task.path.display(), reason = %reason, "Directory skipped");
            }
            Ok(Err(e)) => {
                stats.record_error();
                if e.is_recoverable() {
                    debug!(worker = id, error = %e, "Directory skipped");
                } else {
                    warn!(worker = id, error = %e, "Directory failed");
                }
                let _ = failures.send(TaskFailure::List(e));
            }
            Err(payload) => {
                stats.record_panic();
                let message = panic_message(payload.as_ref());
                error!(worker = id, path = %task.path.display(), message = %message, "Handler panicked");
                let _ = failures.send(TaskFailure::Panicked {
                    path: task.path.clone(),
                    message,
                });
            }
        }
        // `task` drops here, marking it finished
    }

    debug!(
        worker = id,
        tasks = stats.tasks_processed.load(Ordering::Relaxed),
        errors = stats.errors.load(Ordering::Relaxed),
        "Worker shutting down"
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_stats(workers: &[Worker]) -> (u64, u64, u64) {
    let mut tasks = 0u64;
    let mut errors = 0u64;
    let mut panics = 0u64;

    for worker in workers {
        tasks += worker.stats.tasks_processed.load(Ordering::Relaxed);
        errors += worker.stats.errors.load(Ordering::Relaxed);
        panics += worker.stats.panics.load(Ordering::Relaxed);
    }

    (tasks, errors, panics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_worker_stats() {
        let stats = WorkerStats::default();

        stats.record_task();
        stats.record_task();
        stats.record_error();
        stats.record_panic();

        assert_eq!(stats.tasks_processed.load(Ordering::Relaxed), 2);
        assert_eq!(stats.errors.load(Ordering::Relaxed), 1);
        assert_eq!(stats.panics.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_worker_survives_errors_and_panics() {
        let queue = Arc::new(WorkQueue::new(CancellationSignal::new()));
        queue.push(DirTask::root("/denied"));
        queue.push(DirTask::root("/boom"));
        queue.push(DirTask::root("/ok"));

        let handler = Arc::new(|task: &DirTask, _: &WorkQueue, _: &CancellationSignal| -> ListResult<ScanOutcome> {
            match task.path.to_str() {
                Some("/denied") => Err(ListError::PermissionDenied {
                    path: task.path.clone(),
                }),
                Some("/boom") => panic!("handler exploded"),
                _ => Ok(ScanOutcome::Scanned { entries: 0, subdirs: 0 }),
            }
        });

        let (fail_tx, fail_rx) = unbounded();
        let (exit_tx, exit_rx) = unbounded();
        let worker = Worker::spawn(0, Arc::clone(&queue), handler, fail_tx, exit_tx).unwrap();

        assert_eq!(exit_rx.recv().unwrap(), 0);
        let (tasks, errors, panics) = aggregate_stats(std::slice::from_ref(&worker));
        worker.join().unwrap();

        assert_eq!((tasks, errors, panics), (3, 1, 1));
        let failures: Vec<_> = fail_rx.try_iter().collect();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|f| f.path() == Path::new("/boom")));
        assert!(queue.is_exhausted());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
