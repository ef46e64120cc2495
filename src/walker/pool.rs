//! Fixed-size worker pool
//!
//! The pool owns the worker threads for one search run. Its lifecycle is
//! strictly forward:
//!
//! ```text
//! Created ──start()──▶ Running ──cancel/exhausted──▶ Draining ──joined──▶ Stopped
//! ```
//!
//! Shutdown fires the cancellation signal, which wakes every worker
//! blocked on the queue, then joins the threads within a grace period.
//! A worker that does not exit in time is stuck inside its handler; the
//! pool gives up on it and reports [`PoolError::JoinTimeout`].

use crate::error::PoolError;
use crate::walker::queue::WorkQueue;
use crate::walker::worker::{aggregate_stats, TaskFailure, TaskHandler, Worker};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default time allowed for workers to exit after cancellation
pub const DEFAULT_GRACE: Duration = Duration::from_secs(10);

/// Lifecycle of a [`WorkerPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Constructed, no threads yet
    Created,
    /// Threads pulling tasks
    Running,
    /// Cancellation fired, joining threads
    Draining,
    /// All threads joined or abandoned
    Stopped,
}

/// Final accounting for a pool run
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// Tasks handed to handlers
    pub tasks_processed: u64,

    /// Tasks that returned an error
    pub errors: u64,

    /// Tasks whose handler panicked
    pub panics: u64,

    /// Every failed task, in arrival order
    pub failures: Vec<TaskFailure>,
}

/// A fixed set of threads draining one [`WorkQueue`]
pub struct WorkerPool {
    threads: usize,
    grace: Duration,
    state: PoolState,
    queue: Arc<WorkQueue>,
    workers: Vec<Worker>,

    failures_tx: Sender<TaskFailure>,
    failures_rx: Receiver<TaskFailure>,
    exited_tx: Sender<usize>,
    exited_rx: Receiver<usize>,

    /// Outcome of the first shutdown
    outcome: Option<Result<PoolReport, PoolError>>,
}

impl WorkerPool {
    /// Create a pool for `threads` workers over `queue`
    pub fn new(threads: usize, grace: Duration, queue: Arc<WorkQueue>) -> Self {
        let (failures_tx, failures_rx) = unbounded();
        let (exited_tx, exited_rx) = unbounded();

        Self {
            threads,
            grace,
            state: PoolState::Created,
            queue,
            workers: Vec::with_capacity(threads),
            failures_tx,
            failures_rx,
            exited_tx,
            exited_rx,
            outcome: None,
        }
    }

    /// Current lifecycle state
    ///
    /// A running pool reports `Draining` as soon as the signal fires or the
    /// queue runs dry, before anyone calls [`shutdown`](Self::shutdown).
    pub fn state(&self) -> PoolState {
        match self.state {
            PoolState::Running
                if self.queue.signal().is_cancelled() || self.queue.is_exhausted() =>
            {
                PoolState::Draining
            }
            state => state,
        }
    }

    /// Number of threads this pool runs
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Launch the worker threads
    ///
    /// If any thread fails to spawn, the ones already running are shut
    /// down before the error is returned.
    pub fn start<H: TaskHandler>(&mut self, handler: Arc<H>) -> Result<(), PoolError> {
        if self.state != PoolState::Created {
            return Ok(());
        }

        for id in 0..self.threads {
            let spawned = Worker::spawn(
                id,
                Arc::clone(&self.queue),
                Arc::clone(&handler),
                self.failures_tx.clone(),
                self.exited_tx.clone(),
            );

            match spawned {
                Ok(worker) => self.workers.push(worker),
                Err(e) => {
                    self.state = PoolState::Running;
                    if let Err(shutdown_err) = self.shutdown() {
                        warn!(error = %shutdown_err, "Partial pool failed to stop");
                    }
                    return Err(e);
                }
            }
        }

        self.state = PoolState::Running;
        info!(count = self.workers.len(), "Workers spawned");
        Ok(())
    }

    /// Let the run finish on its own, then shut down
    ///
    /// Blocks until the queue is exhausted or the run is cancelled by
    /// someone else (a match, an interrupt).
    pub fn wait(&mut self) -> Result<PoolReport, PoolError> {
        if self.state == PoolState::Running {
            self.queue.wait_until_finished();
        }
        self.shutdown()
    }

    /// Cancel the run and join every worker
    ///
    /// Idempotent: later calls return the first call's outcome.
    pub fn shutdown(&mut self) -> Result<PoolReport, PoolError> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        self.state = PoolState::Draining;
        if self.queue.signal().cancel() {
            debug!("Pool shutdown fired cancellation");
        }

        let outcome = self.join_workers();
        self.state = PoolState::Stopped;
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Join all worker threads and collect final stats
    fn join_workers(&mut self) -> Result<PoolReport, PoolError> {
        let deadline = Instant::now() + self.grace;
        let mut running: HashSet<usize> = self.workers.iter().map(Worker::id).collect();

        while !running.is_empty() {
            match self.exited_rx.recv_deadline(deadline) {
                Ok(id) => {
                    running.remove(&id);
                }
                Err(_) => break,
            }
        }

        let (tasks_processed, errors, panics) = aggregate_stats(&self.workers);

        let workers = std::mem::take(&mut self.workers);
        for worker in workers {
            if running.contains(&worker.id()) {
                warn!(worker = worker.id(), "Worker did not stop in time, abandoning");
                worker.detach();
            } else if let Err(e) = worker.join() {
                warn!(error = %e, "Worker failed to join cleanly");
            }
        }

        let report = PoolReport {
            tasks_processed,
            errors,
            panics,
            failures: self.failures_rx.try_iter().collect(),
        };

        if !running.is_empty() {
            return Err(PoolError::JoinTimeout {
                pending: running.len(),
                grace: self.grace,
            });
        }

        info!(tasks = tasks_processed, errors, "Workers stopped");
        Ok(report)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if matches!(self.state, PoolState::Running | PoolState::Draining) {
            if let Err(e) = self.shutdown() {
                warn!(error = %e, "Pool shutdown on drop failed");
            }
        }
    }
}
