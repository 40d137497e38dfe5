//! Job enumeration.
//!
//! Range mode describes every ID in `start..=end` without touching the
//! network and without materializing the IDs; they are produced lazily as
//! the worker pool dispatches. Discovery mode pages through
//! `GET /projects/{id}/jobs` with a fixed page size until a short (or
//! empty) page arrives or the page limit is reached. A failed page aborts
//! discovery: deleting against a partial job list must never happen
//! silently.

use std::ops::RangeInclusive;

use sweeper_core::{Job, JobId, JobSource, ProjectId};
use sweeper_gitlab::{GitLabApiError, GitLabClient};
use tokio_util::sync::CancellationToken;

/// Jobs requested per listing page.
pub const PER_PAGE: u32 = 100;

/// Jobs produced by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enumeration {
    /// Every ID in `start..=end`. Empty when `end < start`.
    Range { start: JobId, end: JobId },
    /// Records returned by the listing API.
    Discovered {
        jobs: Vec<Job>,
        /// Discovery stopped early because of cancellation; `jobs` holds
        /// only the pages fetched before the signal.
        cancelled: bool,
    },
}

impl Enumeration {
    /// Number of jobs, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        match self {
            Self::Range { start, end } if end >= start => {
                let count = end.abs_diff(*start).saturating_add(1);
                usize::try_from(count).unwrap_or(usize::MAX)
            }
            Self::Range { .. } => 0,
            Self::Discovered { jobs, .. } => jobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Discovered { cancelled: true, .. })
    }

    /// Discovered job records; always empty in range mode.
    pub fn jobs(&self) -> &[Job] {
        match self {
            Self::Range { .. } => &[],
            Self::Discovered { jobs, .. } => jobs,
        }
    }

    /// Job IDs in dispatch order.
    pub fn job_ids(&self) -> JobIds<'_> {
        match self {
            Self::Range { start, end } => JobIds::Range(*start..=*end),
            Self::Discovered { jobs, .. } => JobIds::Listed(jobs.iter()),
        }
    }

    /// Sum of artifact sizes reported by the listing (0 in range mode).
    pub fn artifact_bytes(&self) -> u64 {
        self.jobs().iter().map(Job::artifact_bytes).sum()
    }
}

/// Lazy iterator over the IDs of an [`Enumeration`].
#[derive(Debug, Clone)]
pub enum JobIds<'a> {
    Range(RangeInclusive<JobId>),
    Listed(std::slice::Iter<'a, Job>),
}

impl Iterator for JobIds<'_> {
    type Item = JobId;

    fn next(&mut self) -> Option<JobId> {
        match self {
            Self::Range(ids) => ids.next(),
            Self::Listed(jobs) => jobs.next().map(|job| job.id),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Range(ids) => ids.size_hint(),
            Self::Listed(jobs) => jobs.size_hint(),
        }
    }
}

/// Progress notifications emitted during discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryProgress {
    Page { page: u32, count: usize, total: usize },
    LimitReached { page_limit: u32 },
}

/// A listing page could not be fetched.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch jobs page {page}: {source}")]
pub struct DiscoveryError {
    pub page: u32,
    #[source]
    pub source: GitLabApiError,
}

/// Produce the jobs to process for `source`.
///
/// `on_progress` is called after every fetched page and when the page limit
/// stops discovery. It is never called in range mode.
pub async fn enumerate_jobs(
    client: &dyn GitLabClient,
    project_id: ProjectId,
    source: JobSource,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(DiscoveryProgress) + Send,
) -> Result<Enumeration, DiscoveryError> {
    match source {
        JobSource::Range { start, end } => Ok(Enumeration::Range { start, end }),
        JobSource::Discovery { page_limit } => {
            discover_jobs(client, project_id, page_limit, cancel, &mut on_progress).await
        }
    }
}

async fn discover_jobs(
    client: &dyn GitLabClient,
    project_id: ProjectId,
    page_limit: u32,
    cancel: &CancellationToken,
    on_progress: &mut (dyn FnMut(DiscoveryProgress) + Send),
) -> Result<Enumeration, DiscoveryError> {
    let mut jobs = Vec::new();
    let mut page = 1u32;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(project_id, page, fetched = jobs.len(), "Discovery cancelled");
            return Ok(Enumeration::Discovered {
                jobs,
                cancelled: true,
            });
        }

        let batch = client
            .list_jobs(project_id, page, PER_PAGE)
            .await
            .map_err(|source| DiscoveryError { page, source })?;

        if batch.is_empty() {
            break;
        }

        let count = batch.len();
        jobs.extend(batch);
        tracing::info!(project_id, page, count, total = jobs.len(), "Fetched jobs page");
        on_progress(DiscoveryProgress::Page {
            page,
            count,
            total: jobs.len(),
        });

        if count < PER_PAGE as usize {
            break;
        }
        if page_limit > 0 && page >= page_limit {
            tracing::info!(page_limit, "Reached page limit, stopping job discovery");
            on_progress(DiscoveryProgress::LimitReached { page_limit });
            break;
        }
        page += 1;
    }

    Ok(Enumeration::Discovered {
        jobs,
        cancelled: false,
    })
}
