//! Cancellation signal shared by the queue, the workers and the coordinator
//!
//! The signal is a one-way latch: once fired it stays fired for the rest
//! of the run. Components that block (the work queue) register a listener
//! so that firing the signal wakes them instead of leaving them parked
//! until natural exhaustion.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Listener = Box<dyn Fn() + Send + Sync>;

struct Inner {
    cancelled: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
}

/// Monotonic stop flag plus wake-up notification
///
/// Clone is cheap and shares state.
#[derive(Clone)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    /// Create a new signal (not cancelled)
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation
    ///
    /// Returns `true` for the call that actually fired the signal; every
    /// later call is a no-op returning `false`.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }

        let listeners = self.inner.listeners.lock();
        for listener in listeners.iter() {
            listener();
        }
        true
    }

    /// Run `f` when the signal fires
    ///
    /// If the signal already fired, `f` runs immediately on this thread.
    pub fn on_cancel<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut listeners = self.inner.listeners.lock();
        if self.is_cancelled() {
            drop(listeners);
            f();
            return;
        }
        listeners.push(Box::new(f));
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
