//! End-to-end cleanup run.
//!
//! [`run_cleanup`] validates the configuration, checks the project,
//! enumerates jobs, drives the [`WorkerPool`], and aggregates the
//! [`RunSummary`]. Only configuration, precondition, and discovery errors
//! abort a run; per-job failures surface in the summary.

use std::sync::Arc;

use sweeper_core::{ConfigError, JobSource, ProjectId, RetryPolicy, RunConfig, RunSummary};
use sweeper_events::{EventSink, RunEvent};
use sweeper_gitlab::GitLabClient;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::enumerator::{enumerate_jobs, DiscoveryError, DiscoveryProgress};
use crate::existence::{check_project, CheckError, ProjectExistence};
use crate::pool::{PoolOptions, WorkerPool};

/// A fatal error that stopped the run before deletions started.
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error("Validation error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project {project_id} does not exist on {server}")]
    ProjectNotFound { project_id: ProjectId, server: String },

    #[error("Error checking project: {0}")]
    ProjectCheck(#[from] CheckError),

    #[error("Error fetching jobs: {0}")]
    Discovery(#[from] DiscoveryError),
}

impl CleanupError {
    /// Every fatal error exits with status 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Run one cleanup against `client`.
///
/// Every significant step is reported to `events`; the caller decides
/// where those go (console, audit log, both).
pub async fn run_cleanup(
    client: Arc<dyn GitLabClient>,
    config: &RunConfig,
    events: Arc<dyn EventSink>,
    cancel: &CancellationToken,
) -> Result<RunSummary, CleanupError> {
    config.validate()?;

    let run_id = Uuid::now_v7();
    let project_id = config.project_id;
    tracing::info!(
        %run_id,
        server = %config.server,
        project_id,
        concurrency = config.concurrency,
        dry_run = config.dry_run,
        source = %config.source,
        "Starting artifact cleanup",
    );
    events.emit(&RunEvent::RunStarted {
        run_id,
        server: config.server.clone(),
        project_id,
        concurrency: config.concurrency,
        dry_run: config.dry_run,
        source: config.source.to_string(),
    });

    // --- Precondition ---
    events.emit(&RunEvent::CheckingProject { project_id });
    match check_project(client.as_ref(), project_id, cancel).await {
        Ok(ProjectExistence::Exists) => {
            events.emit(&RunEvent::ProjectValidated { project_id });
        }
        Ok(ProjectExistence::NotExists) => {
            tracing::error!(project_id, server = %config.server, "Project does not exist");
            events.emit(&RunEvent::ProjectMissing {
                project_id,
                server: config.server.clone(),
            });
            return Err(CleanupError::ProjectNotFound {
                project_id,
                server: config.server.clone(),
            });
        }
        Err(e) => {
            tracing::error!(project_id, error = %e, "Project check failed");
            events.emit(&RunEvent::ProjectCheckFailed {
                error: e.to_string(),
            });
            return Err(e.into());
        }
    }

    // --- Enumeration ---
    let discovery = matches!(config.source, JobSource::Discovery { .. });
    if let JobSource::Discovery { page_limit } = config.source {
        events.emit(&RunEvent::DiscoveryStarted {
            project_id,
            page_limit,
        });
    }

    let enumeration = match enumerate_jobs(
        client.as_ref(),
        project_id,
        config.source,
        cancel,
        |progress| events.emit(&progress_event(progress)),
    )
    .await
    {
        Ok(enumeration) => enumeration,
        Err(e) => {
            tracing::error!(error = %e, "Job discovery failed");
            events.emit(&RunEvent::DiscoveryFailed {
                error: e.to_string(),
            });
            return Err(e.into());
        }
    };

    let total = enumeration.len();
    if discovery {
        events.emit(&RunEvent::DiscoveryFinished {
            total,
            artifact_bytes: enumeration.artifact_bytes(),
            cancelled: enumeration.is_cancelled(),
        });
    }

    if enumeration.is_cancelled() {
        // Never delete against a partial job list.
        let summary = RunSummary {
            total,
            ..RunSummary::empty(true)
        };
        events.emit(&RunEvent::Summary(summary.clone()));
        return Ok(summary);
    }

    if enumeration.is_empty() {
        events.emit(&RunEvent::NoJobs);
        let summary = RunSummary::empty(cancel.is_cancelled());
        events.emit(&RunEvent::Summary(summary.clone()));
        return Ok(summary);
    }

    // --- Deletion ---
    let pool = WorkerPool::new(
        client,
        project_id,
        PoolOptions {
            concurrency: config.permits(),
            dry_run: config.dry_run,
            retry: RetryPolicy::default(),
        },
        Arc::clone(&events),
    );
    let report = pool.dispatch(enumeration.job_ids(), total, cancel).await;

    let summary = RunSummary {
        counts: report.counts,
        total,
        dispatched: report.dispatched,
        elapsed: report.elapsed,
        cancelled: report.cancelled,
    };
    tracing::info!(
        successes = summary.counts.successes,
        failures = summary.counts.failures,
        skipped = summary.counts.skipped,
        processed = summary.counts.processed,
        total = summary.total,
        cancelled = summary.cancelled,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Artifact cleanup finished",
    );
    events.emit(&RunEvent::Summary(summary.clone()));

    Ok(summary)
}

fn progress_event(progress: DiscoveryProgress) -> RunEvent {
    match progress {
        DiscoveryProgress::Page { page, count, total } => {
            RunEvent::PageFetched { page, count, total }
        }
        DiscoveryProgress::LimitReached { page_limit } => RunEvent::PageLimitReached { page_limit },
    }
}
