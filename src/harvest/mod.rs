//! Collector orchestration
//!
//! The registry is assembled explicitly through [`RegistryBuilder`]. A run either walks it
//! one collector at a time with a pause in between, or feeds it through a bounded queue
//! drained by a small worker pool. Each collector is run to completion and its artifact
//! published before the worker takes the next one.

mod collector;
mod orchestrator;
mod outcome;
mod queue;
mod registry;
mod summary;
mod work_lock;
mod worker_pool;

pub use collector::Collector;
pub use orchestrator::{DEFAULT_SEQUENTIAL_DELAY, Orchestrator, RunMode, RunSettings, run_collector};
pub use outcome::{Failure, ItemReport, Outcome};
pub use queue::{DEFAULT_QUEUE_CAPACITY, Dispatcher, WorkQueue, bounded};
pub use registry::{Registry, RegistryBuilder};
pub use summary::RunSummary;
pub use work_lock::{LOCK_FILE_NAME, WorkLockGuard, acquire_work_lock};
pub use worker_pool::{PoolOutput, run_workers};
