//! Parallel, cancellable tree search
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────────────┐
//!                     │   SearchCoordinator     │
//!                     │  - seeds root task      │
//!                     │  - accepts one match    │
//!                     └───────────┬─────────────┘
//!                                 │
//!                     ┌───────────▼─────────────┐
//!                     │       WorkQueue         │◀── CancellationSignal
//!                     │  - FIFO + in-flight     │    (wakes, drains)
//!                     └───────────┬─────────────┘
//!       ┌─────────────────────────┼─────────────────────────┐
//!       │                         │                         │
//! ┌─────▼─────┐             ┌─────▼─────┐             ┌─────▼─────┐
//! │  Worker 1 │             │  Worker 2 │             │  Worker N │
//! │  list dir │             │  list dir │             │  list dir │
//! │  match    │             │  match    │             │  match    │
//! │  push sub │             │  push sub │             │  push sub │
//! └───────────┘             └───────────┘             └───────────┘
//! ```

pub mod coordinator;
pub mod matcher;
pub mod pool;
pub mod queue;
pub mod signal;
pub mod worker;

pub use coordinator::{SearchCoordinator, SearchProgress, SearchReport, SearchResult, SearchStats};
pub use matcher::{MatchMode, NameMatcher};
pub use pool::{PoolReport, PoolState, WorkerPool};
pub use queue::{ActiveTask, DirTask, Popped, QueueStats, WorkQueue};
pub use signal::CancellationSignal;
pub use worker::{TaskFailure, TaskHandler, Worker, WorkerStats};
