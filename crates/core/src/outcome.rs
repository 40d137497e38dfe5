//! Per-job outcomes, shared counters, and the run summary.
//!
//! Every job a worker admits ends in exactly one [`JobOutcome`]. The
//! outcome's [`OutcomeKind`] is tallied into [`OutcomeCounters`], which are
//! lock-free and shared by all workers. After the pool drains,
//! [`RunSummary`] combines a counter snapshot with wall-clock time and
//! decides the process exit status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::types::JobId;

// ---------------------------------------------------------------------------
// JobOutcome
// ---------------------------------------------------------------------------

/// Why a deletion was recorded as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with an unexpected status code.
    Status(u16),
    /// Every attempt failed before a response arrived.
    Transport(String),
}

/// Terminal result of processing one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// `204 No Content`: the artifacts were removed.
    Deleted,
    /// `404 Not Found`: the job has no artifacts (or no longer exists).
    NoArtifacts,
    /// Dry-run mode; no request was sent.
    DryRun,
    Failed(FailureReason),
}

/// Which counter an outcome is tallied under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
    Skipped,
}

impl JobOutcome {
    /// Classify the final HTTP status of a deletion.
    pub fn from_status(status: u16) -> Self {
        match status {
            204 => Self::Deleted,
            404 => Self::NoArtifacts,
            other => Self::Failed(FailureReason::Status(other)),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Deleted => OutcomeKind::Success,
            Self::NoArtifacts | Self::DryRun => OutcomeKind::Skipped,
            Self::Failed(_) => OutcomeKind::Failure,
        }
    }

    /// Human-readable line for console output and the audit log.
    pub fn describe(&self, job_id: JobId) -> String {
        match self {
            Self::Deleted => format!("Job {job_id}: artifact deleted successfully"),
            Self::NoArtifacts => format!("Job {job_id}: no artifacts found"),
            Self::DryRun => format!("Job {job_id}: [DRY-RUN] Would delete artifact"),
            Self::Failed(FailureReason::Status(status)) => {
                format!("Job {job_id}: failed to delete artifact (status: {status})")
            }
            Self::Failed(FailureReason::Transport(err)) => {
                format!("Job {job_id}: request failed after retries: {err}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OutcomeCounters
// ---------------------------------------------------------------------------

/// Lock-free tallies shared by every worker.
///
/// Each recorded outcome bumps exactly one of the three kind counters and
/// the `processed` counter. The increments are independent and
/// commutative, so relaxed ordering is enough; the final read happens
/// after all workers have been joined.
#[derive(Debug, Default)]
pub struct OutcomeCounters {
    successes: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
    processed: AtomicU64,
}

impl OutcomeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: OutcomeKind) {
        let counter = match kind {
            OutcomeKind::Success => &self.successes,
            OutcomeKind::Failure => &self.failures,
            OutcomeKind::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`OutcomeCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
    pub processed: u64,
}

impl CounterSnapshot {
    /// `processed == successes + failures + skipped`.
    pub fn is_consistent(&self) -> bool {
        self.processed == self.successes + self.failures + self.skipped
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Final result of a cleanup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub counts: CounterSnapshot,
    /// Jobs produced by the enumerator.
    pub total: usize,
    /// Jobs handed to a worker before dispatch stopped.
    pub dispatched: usize,
    /// Wall-clock time since dispatch began.
    pub elapsed: Duration,
    /// Whether the run was interrupted.
    pub cancelled: bool,
}

impl RunSummary {
    /// Summary of a run that found nothing to do.
    pub fn empty(cancelled: bool) -> Self {
        Self {
            counts: CounterSnapshot::default(),
            total: 0,
            dispatched: 0,
            elapsed: Duration::ZERO,
            cancelled,
        }
    }

    /// Process exit status: 1 if any deletion failed, 0 otherwise.
    ///
    /// Cancellation alone is not a failure.
    pub fn exit_code(&self) -> i32 {
        if self.counts.failures > 0 {
            1
        } else {
            0
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        write!(
            f,
            "Completed in {elapsed:?}. Successes: {}, Failures: {}, Skipped/NotFound: {}, Total: {}",
            self.counts.successes, self.counts.failures, self.counts.skipped, self.total,
        )?;
        if self.cancelled {
            write!(
                f,
                " (cancelled after {} of {} jobs dispatched, {} processed)",
                self.dispatched, self.total, self.counts.processed,
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
