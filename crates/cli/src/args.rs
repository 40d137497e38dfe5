//! Command-line arguments with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sweeper_core::config::{DEFAULT_CONCURRENCY, DEFAULT_LOG_FILE};
use sweeper_core::{ConfigError, JobId, JobSource, ProjectId, RunConfig};

/// Server used when neither `--gitlab-server` nor `GITLAB_SERVER` is set.
pub const DEFAULT_SERVER: &str = "gitlab.example.com";

/// Delete CI job artifacts from a GitLab project.
#[derive(Parser, Debug, Clone)]
#[command(name = "artifact-sweeper", version)]
pub struct Args {
    /// GitLab hostname, or a full base URL such as http://127.0.0.1:8080
    #[arg(long, env = "GITLAB_SERVER", default_value = DEFAULT_SERVER)]
    pub gitlab_server: String,

    /// Private access token
    #[arg(long, env = "GITLAB_TOKEN", default_value = "", hide_env_values = true)]
    pub gitlab_token: String,

    /// Numeric project ID
    #[arg(long, env = "GITLAB_PROJECT_ID", allow_negative_numbers = true)]
    pub project: Option<ProjectId>,

    /// First job ID of the range (requires --end-job)
    #[arg(long, env = "GITLAB_START_JOB", allow_negative_numbers = true)]
    pub start_job: Option<JobId>,

    /// Last job ID of the range, inclusive (requires --start-job)
    #[arg(long, env = "GITLAB_END_JOB", allow_negative_numbers = true)]
    pub end_job: Option<JobId>,

    /// Maximum listing pages to fetch in discovery mode (0 = unlimited)
    #[arg(long, env = "GITLAB_JOB_PAGE_LIMIT", default_value_t = 0)]
    pub page_limit: u32,

    /// Maximum concurrent deletions (1-1000)
    #[arg(long, env = "GITLAB_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// Per-request timeout in seconds
    #[arg(long, env = "GITLAB_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Audit log file, appended to on every run
    #[arg(long, env = "GITLAB_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print one line per job instead of a progress bar
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Assemble the run configuration. Field values are checked later by
    /// [`RunConfig::validate`]; only a missing project or a half-given
    /// range can fail here.
    pub fn into_config(self) -> Result<RunConfig, ConfigError> {
        let project_id = self.project.ok_or(ConfigError::MissingProject)?;
        let source = JobSource::from_bounds(self.start_job, self.end_job, self.page_limit)?;
        Ok(RunConfig {
            server: self.gitlab_server,
            token: self.gitlab_token,
            project_id,
            concurrency: self.concurrency,
            source,
            dry_run: self.dry_run,
            verbose: self.verbose,
            log_file: self.log_file,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}
