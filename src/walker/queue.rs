//! Work queue with termination detection
//!
//! This module provides the shared FIFO of directory tasks. Consumers
//! block in [`WorkQueue::pop`] until a task arrives, the run is cancelled,
//! or the walk is exhausted.
//!
//! Exhaustion is only declared when the queue is empty *and* no task is
//! in flight. A worker that has dequeued a directory may still push its
//! children, so an empty queue alone does not mean the walk is over.

use crate::walker::signal::CancellationSignal;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A task to scan a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTask {
    /// Full path to the directory
    pub path: PathBuf,

    /// Depth from root (0 = root)
    pub depth: usize,
}

impl DirTask {
    /// Create a new directory task
    pub fn new(path: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            path: path.into(),
            depth,
        }
    }

    /// Create the root task
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self::new(path, 0)
    }

    /// Task for a subdirectory of this one
    pub fn child(&self, path: impl Into<PathBuf>) -> Self {
        Self::new(path, self.depth + 1)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Statistics for the work queue
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total tasks accepted
    pub enqueued: AtomicU64,

    /// Total tasks handed to workers
    pub dequeued: AtomicU64,

    /// Pushes refused after cancellation or exhaustion
    pub rejected: AtomicU64,

    /// Pending tasks dropped unexecuted on cancellation
    pub discarded: AtomicU64,
}

impl QueueStats {
    /// Get queue throughput (dequeued tasks)
    pub fn throughput(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Get number of refused pushes
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Get number of discarded tasks
    pub fn discarded_count(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<DirTask>,

    /// Tasks dequeued but not yet finished
    in_flight: usize,

    /// Set once; no task will ever be produced again
    exhausted: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,

    /// Wakes consumers blocked in `pop`
    ready: Condvar,

    /// Wakes callers blocked in `wait_until_finished`
    done: Condvar,

    stats: QueueStats,
}

/// Result of [`WorkQueue::pop`]
#[derive(Debug)]
pub enum Popped<'a> {
    /// A task to execute; finishing it is tracked by the guard
    Task(ActiveTask<'a>),

    /// No more tasks will ever be produced for this run
    EndOfWork,
}

/// Shared FIFO of directory tasks
#[derive(Debug)]
pub struct WorkQueue {
    shared: Arc<Shared>,
    signal: CancellationSignal,
}

impl WorkQueue {
    /// Create a new work queue bound to a cancellation signal
    ///
    /// When the signal fires, pending tasks are discarded and every
    /// blocked consumer is woken.
    pub fn new(signal: CancellationSignal) -> Self {
        let shared = Arc::new(Shared::default());

        let weak = Arc::downgrade(&shared);
        signal.on_cancel(move || {
            if let Some(shared) = weak.upgrade() {
                let mut state = shared.state.lock();
                let dropped = state.pending.len() as u64;
                state.pending.clear();
                shared.stats.discarded.fetch_add(dropped, Ordering::Relaxed);
                drop(state);

                shared.ready.notify_all();
                shared.done.notify_all();
            }
        });

        Self { shared, signal }
    }

    /// Seed the queue with the root directory
    pub fn seed(&self, root_path: impl Into<PathBuf>) -> bool {
        self.push(DirTask::root(root_path))
    }

    /// Append a task
    ///
    /// Returns `false` without queueing when the run is cancelled or
    /// already exhausted. Wakes at most one blocked consumer.
    pub fn push(&self, task: DirTask) -> bool {
        if self.signal.is_cancelled() {
            self.shared.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let mut state = self.shared.state.lock();
        // Re-check under the lock: the cancel listener clears under it too
        if state.exhausted || self.signal.is_cancelled() {
            self.shared.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        state.pending.push_back(task);
        drop(state);

        self.shared.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        self.shared.ready.notify_one();
        true
    }

    /// Take the next task, blocking until one is available
    ///
    /// Returns [`Popped::EndOfWork`] once the run is cancelled or the walk
    /// is exhausted, to this and every later caller.
    pub fn pop(&self) -> Popped<'_> {
        let mut state = self.shared.state.lock();
        loop {
            if state.exhausted || self.signal.is_cancelled() {
                return Popped::EndOfWork;
            }

            if let Some(task) = state.pending.pop_front() {
                state.in_flight += 1;
                self.shared.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                return Popped::Task(ActiveTask {
                    task,
                    queue: self,
                });
            }

            if state.in_flight == 0 {
                state.exhausted = true;
                self.shared.ready.notify_all();
                self.shared.done.notify_all();
                return Popped::EndOfWork;
            }

            self.shared.ready.wait(&mut state);
        }
    }

    /// Block until the walk is exhausted or the run is cancelled
    pub fn wait_until_finished(&self) {
        let mut state = self.shared.state.lock();
        while !state.exhausted && !self.signal.is_cancelled() {
            if state.pending.is_empty() && state.in_flight == 0 {
                state.exhausted = true;
                self.shared.ready.notify_all();
                break;
            }
            self.shared.done.wait(&mut state);
        }
    }

    fn finish_task(&self) {
        let mut state = self.shared.state.lock();
        state.in_flight -= 1;

        if state.in_flight == 0 && state.pending.is_empty() {
            if !state.exhausted && !self.signal.is_cancelled() {
                state.exhausted = true;
            }
            drop(state);
            self.shared.ready.notify_all();
            self.shared.done.notify_all();
        }
    }

    /// Cancellation signal this queue observes
    pub fn signal(&self) -> &CancellationSignal {
        &self.signal
    }

    /// Get queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.shared.stats
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().pending.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Number of tasks dequeued but not yet finished
    pub fn in_flight(&self) -> usize {
        self.shared.state.lock().in_flight
    }

    /// Check if exhaustion has been declared
    pub fn is_exhausted(&self) -> bool {
        self.shared.state.lock().exhausted
    }

    /// Check if all work is complete
    ///
    /// Work is complete when:
    /// 1. Queue is empty
    /// 2. No task is in flight
    pub fn is_complete(&self) -> bool {
        let state = self.shared.state.lock();
        state.pending.is_empty() && state.in_flight == 0
    }
}

/// RAII guard for a dequeued task
///
/// Dropping the guard marks the task finished, which is what lets the
/// queue detect exhaustion. It drops on unwind too, so a panicking
/// handler cannot leave the in-flight count stuck.
#[derive(Debug)]
pub struct ActiveTask<'a> {
    task: DirTask,
    queue: &'a WorkQueue,
}

impl Deref for ActiveTask<'_> {
    type Target = DirTask;

    fn deref(&self) -> &DirTask {
        &self.task
    }
}

impl Drop for ActiveTask<'_> {
    fn drop(&mut self) {
        self.queue.finish_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    fn expect_task(popped: Popped<'_>) -> ActiveTask<'_> {
        match popped {
            Popped::Task(task) => task,
            Popped::EndOfWork => panic!("expected a task"),
        }
    }

    #[test]
    fn test_queue_basic() {
        let queue = WorkQueue::new(CancellationSignal::new());

        assert!(queue.seed("/test"));
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 1);

        let task = expect_task(queue.pop());
        assert_eq!(task.path, PathBuf::from("/test"));
        assert_eq!(task.depth, 0);
        assert_eq!(queue.in_flight(), 1);
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new(CancellationSignal::new());
        queue.push(DirTask::new("/a", 0));
        queue.push(DirTask::new("/b", 0));

        let first = expect_task(queue.pop());
        let second = expect_task(queue.pop());
        assert_eq!(first.path, PathBuf::from("/a"));
        assert_eq!(second.path, PathBuf::from("/b"));
    }

    #[test]
    fn test_queue_completion() {
        let queue = WorkQueue::new(CancellationSignal::new());

        // Empty queue with nothing in flight = complete
        assert!(queue.is_complete());

        queue.seed("/test");
        assert!(!queue.is_complete());

        let task = expect_task(queue.pop());

        // Queue empty but task in flight
        assert!(!queue.is_complete());
        assert!(!queue.is_exhausted());

        // Children pushed while in flight keep the walk alive
        assert!(queue.push(task.child("/test/sub")));
        drop(task);
        assert!(!queue.is_exhausted());

        let sub = expect_task(queue.pop());
        assert_eq!(sub.depth, 1);
        drop(sub);

        assert!(queue.is_complete());
        assert!(queue.is_exhausted());
        assert!(matches!(queue.pop(), Popped::EndOfWork));
    }

    #[test]
    fn test_push_after_exhaustion_is_noop() {
        let queue = WorkQueue::new(CancellationSignal::new());
        assert!(matches!(queue.pop(), Popped::EndOfWork));

        assert!(!queue.push(DirTask::root("/late")));
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.stats().rejected_count(), 1);
    }

    #[test]
    fn test_cancel_rejects_and_discards() {
        let signal = CancellationSignal::new();
        let queue = WorkQueue::new(signal.clone());

        queue.push(DirTask::new("/a", 0));
        queue.push(DirTask::new("/b", 0));
        signal.cancel();

        assert_eq!(queue.len(), 0);
        assert_eq!(queue.stats().discarded_count(), 2);
        assert!(!queue.push(DirTask::new("/c", 0)));
        assert_eq!(queue.stats().rejected_count(), 1);
        assert!(matches!(queue.pop(), Popped::EndOfWork));
    }

    #[test]
    fn test_push_wakes_blocked_consumer() {
        let queue = Arc::new(WorkQueue::new(CancellationSignal::new()));
        queue.seed("/root");

        // Hold the root in flight so the consumer blocks instead of ending
        let holder = Arc::clone(&queue);
        let (tx, rx) = crossbeam_channel::bounded(1);
        let consumer = thread::spawn(move || {
            let task = expect_task(holder.pop());
            tx.send(()).unwrap();
            let child = match holder.pop() {
                Popped::Task(t) => Some(t.path.clone()),
                Popped::EndOfWork => None,
            };
            drop(task);
            child
        });

        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        queue.push(DirTask::new("/root/child", 1));

        assert_eq!(consumer.join().unwrap(), Some(PathBuf::from("/root/child")));
    }

    #[test]
    fn test_cancel_wakes_blocked_consumers() {
        let signal = CancellationSignal::new();
        let queue = Arc::new(WorkQueue::new(signal.clone()));
        queue.seed("/root");
        let root = expect_task(queue.pop());

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || matches!(queue.pop(), Popped::EndOfWork))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        signal.cancel();

        for consumer in consumers {
            assert!(consumer.join().unwrap());
        }
        drop(root);
    }

    #[test]
    fn test_exactly_once_delivery() {
        let queue = Arc::new(WorkQueue::new(CancellationSignal::new()));
        for i in 0..1000 {
            queue.push(DirTask::new(format!("/t{}", i), 0));
        }

        let consumers: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Popped::Task(task) = queue.pop() {
                        seen.push(task.path.clone());
                    }
                    seen
                })
            })
            .collect();

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.join().unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 1000);
        assert_eq!(unique.len(), 1000);
        assert_eq!(queue.stats().throughput(), 1000);
    }

    #[test]
    fn test_wait_until_finished() {
        let queue = Arc::new(WorkQueue::new(CancellationSignal::new()));
        queue.seed("/root");

        let worker_queue = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            while let Popped::Task(task) = worker_queue.pop() {
                if task.depth < 3 {
                    let path = task.path.join("d");
                    worker_queue.push(task.child(path));
                }
            }
        });

        queue.wait_until_finished();
        assert!(queue.is_exhausted());
        worker.join().unwrap();
        assert_eq!(queue.stats().throughput(), 4);
    }
}
