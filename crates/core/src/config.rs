//! Run configuration and its validation.
//!
//! [`RunConfig`] is assembled by the CLI from flags and environment
//! variables and must pass [`RunConfig::validate`] before the pipeline
//! touches the network or the audit log.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{JobId, ProjectId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest accepted number of concurrent deletions.
pub const MIN_CONCURRENCY: i64 = 1;

/// Largest accepted number of concurrent deletions.
pub const MAX_CONCURRENCY: i64 = 1000;

/// Concurrency used when none is configured.
pub const DEFAULT_CONCURRENCY: i64 = 70;

/// Per-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Audit log path used when none is configured.
pub const DEFAULT_LOG_FILE: &str = "artifact-cleaner.log";

// ---------------------------------------------------------------------------
// JobSource
// ---------------------------------------------------------------------------

/// Where the set of job IDs to process comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSource {
    /// Every ID in `start..=end`, no listing request needed.
    Range { start: JobId, end: JobId },
    /// Paginated listing from the jobs API. A `page_limit` of 0 means
    /// no limit.
    Discovery { page_limit: u32 },
}

impl JobSource {
    /// Build a source from optional range bounds.
    ///
    /// Both bounds select range mode, neither selects discovery mode, and
    /// exactly one is a configuration error.
    pub fn from_bounds(
        start: Option<JobId>,
        end: Option<JobId>,
        page_limit: u32,
    ) -> Result<Self, ConfigError> {
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self::Range { start, end }),
            (None, None) => Ok(Self::Discovery { page_limit }),
            _ => Err(ConfigError::IncompleteRange),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Range { start, end } = *self {
            if start <= 0 {
                return Err(ConfigError::InvalidStartJob(start));
            }
            if end < start {
                return Err(ConfigError::InvalidRange { start, end });
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range { start, end } => write!(f, "range {start}..={end}"),
            Self::Discovery { page_limit: 0 } => write!(f, "discovery (no page limit)"),
            Self::Discovery { page_limit } => write!(f, "discovery (page limit {page_limit})"),
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Everything a single cleanup run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// GitLab hostname, or a full base URL including the scheme.
    pub server: String,
    /// Private access token sent with every request.
    pub token: String,
    pub project_id: ProjectId,
    /// Maximum number of deletions in flight at once.
    pub concurrency: i64,
    pub source: JobSource,
    /// Classify every job as skipped without issuing DELETE requests.
    pub dry_run: bool,
    /// Print one console line per job instead of a progress bar.
    pub verbose: bool,
    /// Append-only audit log destination.
    pub log_file: PathBuf,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl RunConfig {
    /// Check every field against its allowed domain.
    ///
    /// Rules are checked in a fixed order so the same invalid config always
    /// produces the same error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::EmptyServer);
        }
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.project_id <= 0 {
            return Err(ConfigError::InvalidProjectId(self.project_id));
        }
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ConfigError::ConcurrencyOutOfRange {
                got: self.concurrency,
                min: MIN_CONCURRENCY,
                max: MAX_CONCURRENCY,
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        self.source.validate()
    }

    /// Number of semaphore permits for the worker pool.
    ///
    /// Clamped into the valid range so an unvalidated config can never
    /// produce a zero-permit (deadlocking) pool.
    pub fn permits(&self) -> usize {
        self.concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY) as usize
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
