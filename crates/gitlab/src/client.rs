//! Transport seam used by the deletion pipeline.

use async_trait::async_trait;
use reqwest::StatusCode;
use sweeper_core::{Job, JobId, ProjectId};

use crate::api::GitLabApiError;

/// The subset of the GitLab API the sweeper consumes.
///
/// Implementations must be safe to share across every worker task.
#[async_trait]
pub trait GitLabClient: Send + Sync {
    /// `GET /projects/{id}`. Returns the response status; `Err` only when
    /// no response was received.
    async fn project_status(&self, project_id: ProjectId) -> Result<StatusCode, GitLabApiError>;

    /// `GET /projects/{id}/jobs?per_page=&page=`. Any non-200 status is an
    /// error.
    async fn list_jobs(
        &self,
        project_id: ProjectId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Job>, GitLabApiError>;

    /// `DELETE /projects/{id}/jobs/{job_id}/artifacts`. Returns the response
    /// status unclassified; `Err` only when no response was received.
    async fn delete_artifacts(
        &self,
        project_id: ProjectId,
        job_id: JobId,
    ) -> Result<StatusCode, GitLabApiError>;
}
