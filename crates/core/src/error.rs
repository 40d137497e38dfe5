use crate::types::{JobId, ProjectId};

/// A run configuration value outside its allowed domain.
///
/// Each rule has its own variant so callers (and tests) can tell exactly
/// which field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("gitlab-server cannot be empty")]
    EmptyServer,

    #[error("gitlab-token is required")]
    MissingToken,

    #[error("project ID is required")]
    MissingProject,

    #[error("project ID must be positive, got {0}")]
    InvalidProjectId(ProjectId),

    #[error("concurrency must be between {min} and {max}, got {got}")]
    ConcurrencyOutOfRange { got: i64, min: i64, max: i64 },

    #[error("start job ID must be positive, got {0}")]
    InvalidStartJob(JobId),

    #[error("end job ID ({end}) must not be less than start job ID ({start})")]
    InvalidRange { start: JobId, end: JobId },

    #[error("both --start-job and --end-job are required for range mode")]
    IncompleteRange,

    #[error("request timeout must be at least one second")]
    ZeroRequestTimeout,
}
