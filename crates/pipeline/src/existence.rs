//! Project existence precondition.
//!
//! A single `GET /projects/{id}` with no retries. Any failure here aborts
//! the whole run before enumeration starts.

use sweeper_core::ProjectId;
use sweeper_gitlab::{GitLabApiError, GitLabClient, StatusCode};
use tokio_util::sync::CancellationToken;

/// Answer from a successful existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectExistence {
    Exists,
    NotExists,
}

/// The existence check could not produce an answer.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("cancelled before the project check was sent")]
    Cancelled,

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error(transparent)]
    Transport(#[from] GitLabApiError),
}

/// Look up `project_id`.
///
/// Returns [`CheckError::Cancelled`] without sending a request if `cancel`
/// is already triggered.
pub async fn check_project(
    client: &dyn GitLabClient,
    project_id: ProjectId,
    cancel: &CancellationToken,
) -> Result<ProjectExistence, CheckError> {
    if cancel.is_cancelled() {
        return Err(CheckError::Cancelled);
    }

    let status = client.project_status(project_id).await?;
    tracing::debug!(project_id, status = status.as_u16(), "Project lookup");

    match status {
        StatusCode::OK => Ok(ProjectExistence::Exists),
        StatusCode::NOT_FOUND => Ok(ProjectExistence::NotExists),
        other => Err(CheckError::UnexpectedStatus(other.as_u16())),
    }
}
