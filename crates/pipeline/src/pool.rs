//! Semaphore-bounded deletion worker pool.
//!
//! The dispatch loop acquires one permit per job before spawning its
//! worker task, so at most `concurrency` deletions are ever in flight and
//! no more than that many tasks exist at once. Each worker owns its permit
//! and drops it on every exit path.
//!
//! Cancellation is cooperative. Once the token fires the dispatch loop
//! stops launching workers, waiting workers give up at their next
//! suspension point (backoff sleep or attempt boundary) without being
//! counted, and requests already sent are allowed to complete. The pool
//! always drains every launched worker before reporting.

use std::sync::Arc;
use std::time::Duration;

use sweeper_core::config::DEFAULT_CONCURRENCY;
use sweeper_core::{
    CounterSnapshot, FailureReason, JobId, JobOutcome, OutcomeCounters, ProjectId, RetryPolicy,
};
use sweeper_events::{EventSink, RunEvent};
use sweeper_gitlab::GitLabClient;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// Tunable parameters for a [`WorkerPool`].
#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    /// Maximum simultaneous deletions. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Record every job as skipped without sending DELETE requests.
    pub dry_run: bool,
    pub retry: RetryPolicy,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY as usize,
            dry_run: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// What happened during one [`WorkerPool::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReport {
    pub counts: CounterSnapshot,
    /// Jobs that acquired a permit and were handed to a worker.
    pub dispatched: usize,
    /// Wall-clock time from the start of dispatch until the pool drained.
    pub elapsed: Duration,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Deletes job artifacts for one project under a concurrency bound.
pub struct WorkerPool {
    client: Arc<dyn GitLabClient>,
    project_id: ProjectId,
    options: PoolOptions,
    events: Arc<dyn EventSink>,
}

impl WorkerPool {
    pub fn new(
        client: Arc<dyn GitLabClient>,
        project_id: ProjectId,
        options: PoolOptions,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            client,
            project_id,
            options: PoolOptions {
                concurrency: options.concurrency.max(1),
                ..options
            },
            events,
        }
    }

    /// Process every job in `job_ids` and wait for all launched workers.
    pub async fn run(&self, job_ids: &[JobId], cancel: &CancellationToken) -> PoolReport {
        self.dispatch(job_ids.iter().copied(), job_ids.len(), cancel).await
    }

    /// Process `total` jobs pulled lazily from `job_ids`.
    ///
    /// IDs are drawn one at a time as permits free up, so only the jobs in
    /// flight are ever held. Jobs never launched because of cancellation
    /// are not counted, so `counts.processed <= dispatched <= total` always
    /// holds and `counts` is internally consistent.
    pub async fn dispatch<I>(
        &self,
        job_ids: I,
        total: usize,
        cancel: &CancellationToken,
    ) -> PoolReport
    where
        I: IntoIterator<Item = JobId>,
    {
        let counters = Arc::new(OutcomeCounters::new());
        let worker = Arc::new(Worker {
            client: Arc::clone(&self.client),
            project_id: self.project_id,
            dry_run: self.options.dry_run,
            retry: self.options.retry,
            counters: Arc::clone(&counters),
            events: Arc::clone(&self.events),
        });
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let mut tasks = JoinSet::new();
        let mut dispatched = 0usize;
        let started = Instant::now();

        tracing::info!(
            project_id = self.project_id,
            total,
            concurrency = self.options.concurrency,
            dry_run = self.options.dry_run,
            "Dispatching artifact deletions",
        );
        self.events.emit(&RunEvent::DispatchStarted {
            total,
            dry_run: self.options.dry_run,
        });

        for job_id in job_ids {
            if cancel.is_cancelled() {
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // The semaphore is never closed.
                    Err(_) => break,
                },
            };

            dispatched += 1;
            let worker = Arc::clone(&worker);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                worker.process_one(job_id, &cancel).await;
            });
        }

        if dispatched < total {
            tracing::warn!(
                dispatched,
                total,
                in_flight = tasks.len(),
                "Cancellation requested, waiting for ongoing operations",
            );
            self.events
                .emit(&RunEvent::DispatchStopped { dispatched, total });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }

        let counts = counters.snapshot();
        debug_assert!(counts.is_consistent());
        PoolReport {
            counts,
            dispatched,
            elapsed: started.elapsed(),
            cancelled: cancel.is_cancelled(),
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// State shared by every worker task of one run.
struct Worker {
    client: Arc<dyn GitLabClient>,
    project_id: ProjectId,
    dry_run: bool,
    retry: RetryPolicy,
    counters: Arc<OutcomeCounters>,
    events: Arc<dyn EventSink>,
}

impl Worker {
    /// Handle one job. Returns `None` when cancellation abandoned the job,
    /// in which case nothing was counted or reported.
    async fn process_one(&self, job_id: JobId, cancel: &CancellationToken) -> Option<JobOutcome> {
        if cancel.is_cancelled() {
            tracing::debug!(job_id, "Cancelled before start, job not counted");
            return None;
        }

        let outcome = if self.dry_run {
            JobOutcome::DryRun
        } else {
            self.delete_with_retry(job_id, cancel).await?
        };

        self.finish(job_id, &outcome);
        Some(outcome)
    }

    /// Attempt the deletion until it yields a final answer or the retry
    /// budget runs out.
    async fn delete_with_retry(
        &self,
        job_id: JobId,
        cancel: &CancellationToken,
    ) -> Option<JobOutcome> {
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                tracing::debug!(job_id, attempt, "Cancelled between attempts, job not counted");
                return None;
            }

            let (outcome, reason) = match self.client.delete_artifacts(self.project_id, job_id).await
            {
                Ok(status) if RetryPolicy::is_retryable_status(status.as_u16()) => (
                    JobOutcome::from_status(status.as_u16()),
                    format!("status {}", status.as_u16()),
                ),
                Ok(status) => return Some(JobOutcome::from_status(status.as_u16())),
                Err(e) => (
                    JobOutcome::Failed(FailureReason::Transport(e.to_string())),
                    e.to_string(),
                ),
            };

            let Some(delay) = self.retry.delay_after(attempt) else {
                return Some(outcome);
            };
            attempt += 1;

            tracing::warn!(
                job_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "Artifact deletion attempt failed, retrying",
            );
            self.events.emit(&RunEvent::JobRetry {
                job_id,
                attempt,
                delay,
                reason,
            });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(job_id, attempt, "Cancelled during backoff, job not counted");
                    return None;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Record a terminal outcome exactly once.
    fn finish(&self, job_id: JobId, outcome: &JobOutcome) {
        self.counters.record(outcome.kind());
        match outcome {
            JobOutcome::Failed(reason) => {
                tracing::warn!(job_id, reason = ?reason, "Artifact deletion failed");
            }
            other => tracing::debug!(job_id, outcome = ?other, "Job processed"),
        }
        self.events.emit(&RunEvent::JobFinished {
            job_id,
            outcome: outcome.clone(),
        });
    }
}
