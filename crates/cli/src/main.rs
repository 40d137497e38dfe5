//! `artifact-sweeper` -- bulk-delete CI job artifacts from a GitLab project.
//!
//! Jobs are either an explicit ID range or discovered from the jobs API.
//! Every deletion is retried on transient failure, logged to an append-only
//! audit file, and tallied into a final summary.
//!
//! # Environment variables
//!
//! Every flag falls back to an environment variable (a `.env` file is
//! loaded if present):
//!
//! | Variable                      | Flag                     | Default                |
//! |-------------------------------|--------------------------|------------------------|
//! | `GITLAB_SERVER`               | `--gitlab-server`        | `gitlab.example.com`   |
//! | `GITLAB_TOKEN`                | `--gitlab-token`         | --                     |
//! | `GITLAB_PROJECT_ID`           | `--project`              | --                     |
//! | `GITLAB_START_JOB`            | `--start-job`            | unset (discovery)      |
//! | `GITLAB_END_JOB`              | `--end-job`              | unset (discovery)      |
//! | `GITLAB_JOB_PAGE_LIMIT`       | `--page-limit`           | `0` (unlimited)        |
//! | `GITLAB_CONCURRENCY`          | `--concurrency`          | `70`                   |
//! | `GITLAB_REQUEST_TIMEOUT_SECS` | `--request-timeout-secs` | `30`                   |
//! | `GITLAB_LOG_FILE`             | `--log-file`             | `artifact-cleaner.log` |
//!
//! Exit status is 0 when no deletion failed, 1 otherwise or on any fatal
//! error.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sweeper_cli::args::Args;
use sweeper_cli::console::{self, ConsoleReporter};
use sweeper_events::{AuditLog, EventFanout, EventSink, RunEvent};
use sweeper_gitlab::GitLabApi;
use sweeper_pipeline::run_cleanup;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "artifact_sweeper=info,sweeper_pipeline=info";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors.
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = match args.into_config().and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Validation error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let audit = AuditLog::open(&config.log_file).context("failed to open audit log")?;
    let client = GitLabApi::new(&config.server, config.token.clone(), config.request_timeout)
        .context("failed to build HTTP client")?;

    println!("{}\n", console::banner(&config));
    if config.dry_run {
        println!("[DRY-RUN] No artifacts will be deleted\n");
    }

    let events: Arc<dyn EventSink> = Arc::new(
        EventFanout::new()
            .with(Arc::new(audit))
            .with(Arc::new(ConsoleReporter::new(config.verbose))),
    );

    let cancel = CancellationToken::new();
    let signal_handle = tokio::spawn({
        let cancel = cancel.clone();
        let events = Arc::clone(&events);
        async move {
            shutdown_signal().await;
            tracing::warn!("Interrupt received, stopping new deletions");
            events.emit(&RunEvent::Interrupted);
            cancel.cancel();
        }
    });

    let result = run_cleanup(Arc::new(client), &config, events, &cancel).await;
    signal_handle.abort();

    match result {
        Ok(summary) => Ok(exit_code(summary.exit_code())),
        Err(e) => {
            eprintln!("{e}");
            Ok(exit_code(e.exit_code()))
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
