//! Bounded-concurrency artifact deletion pipeline.
//!
//! A run flows through four stages:
//!
//! 1. [`existence`]: confirm the project exists before any destructive
//!    work (fail fast, no retries).
//! 2. [`enumerator`]: produce the jobs to process, either from an ID range
//!    or by paginated discovery.
//! 3. [`pool`]: delete each job's artifacts under a semaphore-bounded
//!    worker pool with per-job retry and cooperative cancellation.
//! 4. [`cleanup`]: orchestrate the stages and aggregate a
//!    [`RunSummary`](sweeper_core::RunSummary).
//!
//! Every blocking point takes a [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod cleanup;
pub mod enumerator;
pub mod existence;
pub mod pool;

pub use cleanup::{run_cleanup, CleanupError};
pub use enumerator::{
    enumerate_jobs, DiscoveryError, DiscoveryProgress, Enumeration, JobIds, PER_PAGE,
};
pub use existence::{check_project, CheckError, ProjectExistence};
pub use pool::{PoolOptions, PoolReport, WorkerPool};
