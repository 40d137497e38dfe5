//! Domain types for the artifact sweeper.
//!
//! Everything in this crate is pure: run configuration and its validation,
//! job records, the retry schedule, outcome classification, and the shared
//! counters used by the deletion pipeline. Network and file I/O live in the
//! downstream crates.

pub mod config;
pub mod error;
pub mod job;
pub mod outcome;
pub mod retry;
pub mod types;

pub use config::{JobSource, RunConfig};
pub use error::ConfigError;
pub use job::{ArtifactFile, Job};
pub use outcome::{
    CounterSnapshot, FailureReason, JobOutcome, OutcomeCounters, OutcomeKind, RunSummary,
};
pub use retry::RetryPolicy;
pub use types::{JobId, ProjectId};
