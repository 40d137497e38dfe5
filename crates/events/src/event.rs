//! Run event records.

use std::time::Duration;

use sweeper_core::{JobId, JobOutcome, ProjectId, RunSummary};
use uuid::Uuid;

/// A significant event in a cleanup run.
///
/// The [`Display`](std::fmt::Display) form is the audit log line (without
/// the timestamp prefix).
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        server: String,
        project_id: ProjectId,
        concurrency: i64,
        dry_run: bool,
        source: String,
    },
    CheckingProject {
        project_id: ProjectId,
    },
    ProjectValidated {
        project_id: ProjectId,
    },
    ProjectMissing {
        project_id: ProjectId,
        server: String,
    },
    ProjectCheckFailed {
        error: String,
    },
    DiscoveryStarted {
        project_id: ProjectId,
        page_limit: u32,
    },
    PageFetched {
        page: u32,
        count: usize,
        total: usize,
    },
    PageLimitReached {
        page_limit: u32,
    },
    DiscoveryFinished {
        total: usize,
        artifact_bytes: u64,
        cancelled: bool,
    },
    DiscoveryFailed {
        error: String,
    },
    NoJobs,
    /// The worker pool is about to process `total` jobs.
    DispatchStarted {
        total: usize,
        dry_run: bool,
    },
    /// Cancellation stopped the dispatch loop before every job was
    /// launched. In-flight workers still finish.
    DispatchStopped {
        dispatched: usize,
        total: usize,
    },
    JobFinished {
        job_id: JobId,
        outcome: JobOutcome,
    },
    JobRetry {
        job_id: JobId,
        attempt: u32,
        delay: Duration,
        reason: String,
    },
    Interrupted,
    Summary(RunSummary),
}

impl std::fmt::Display for RunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunStarted {
                run_id,
                server,
                project_id,
                concurrency,
                dry_run,
                source,
            } => write!(
                f,
                "Starting artifact cleanup: run={run_id}, server={server}, project={project_id}, \
                 concurrency={concurrency}, dryRun={dry_run}, source={source}"
            ),
            Self::CheckingProject { project_id } => write!(f, "Validating project {project_id}..."),
            Self::ProjectValidated { project_id } => write!(f, "Project {project_id} validated"),
            Self::ProjectMissing { project_id, server } => {
                write!(f, "Project {project_id} does not exist on {server}")
            }
            Self::ProjectCheckFailed { error } => write!(f, "Error checking project: {error}"),
            Self::DiscoveryStarted {
                project_id,
                page_limit,
            } => write!(
                f,
                "Fetching jobs from project {project_id} (page limit: {page_limit})..."
            ),
            Self::PageFetched { page, count, total } => write!(
                f,
                "Fetched page {page}: {count} jobs (total so far: {total})"
            ),
            Self::PageLimitReached { page_limit } => write!(
                f,
                "Reached page limit ({page_limit}), stopping job discovery"
            ),
            Self::DiscoveryFinished {
                total,
                artifact_bytes,
                cancelled,
            } => {
                write!(
                    f,
                    "Total jobs fetched: {total} ({artifact_bytes} artifact bytes reported)"
                )?;
                if *cancelled {
                    write!(f, " [partial: discovery cancelled]")?;
                }
                Ok(())
            }
            Self::DiscoveryFailed { error } => write!(f, "Error fetching jobs: {error}"),
            Self::NoJobs => write!(f, "No jobs found in project"),
            Self::DispatchStarted { total, dry_run } => {
                if *dry_run {
                    write!(f, "[DRY-RUN MODE] Would process {total} jobs")
                } else {
                    write!(f, "Processing {total} jobs...")
                }
            }
            Self::DispatchStopped { dispatched, total } => write!(
                f,
                "Cancellation requested after dispatching {dispatched} of {total} jobs, \
                 waiting for ongoing operations..."
            ),
            Self::JobFinished { job_id, outcome } => f.write_str(&outcome.describe(*job_id)),
            Self::JobRetry {
                job_id,
                attempt,
                delay,
                reason,
            } => write!(
                f,
                "Job {job_id}: attempt {attempt} failed ({reason}), retrying in {delay:?}"
            ),
            Self::Interrupted => {
                write!(f, "Received interrupt signal. Shutting down gracefully...")
            }
            Self::Summary(summary) => write!(f, "{summary}"),
        }
    }
}
