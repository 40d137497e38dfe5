//! Terminal output.
//!
//! [`ConsoleReporter`] turns run events into stdout lines. In verbose mode
//! every job gets its own line; otherwise discovery shows a spinner and
//! deletion shows a progress bar, with only failures printed above it.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sweeper_core::{JobOutcome, RunConfig};
use sweeper_events::{EventSink, RunEvent};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) eta {eta}";
const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";

/// Configuration banner printed before any work starts.
pub fn banner(config: &RunConfig) -> String {
    [
        "GitLab Artifacts Cleaner".to_string(),
        "========================".to_string(),
        format!("Server:       {}", config.server),
        format!("Project ID:   {}", config.project_id),
        format!("Concurrency:  {}", config.concurrency),
        format!("Jobs:         {}", config.source),
        format!("Dry Run:      {}", config.dry_run),
        format!("Verbose:      {}", config.verbose),
        format!("Log File:     {}", config.log_file.display()),
    ]
    .join("\n")
}

/// The line to print for `event`, if any.
///
/// Fatal errors are not rendered here; the binary prints them once on
/// exit.
pub fn message(event: &RunEvent, verbose: bool) -> Option<String> {
    match event {
        RunEvent::CheckingProject { .. } => Some("Validating project...".to_string()),
        RunEvent::ProjectValidated { .. } => Some("✓ Project validated".to_string()),
        RunEvent::DiscoveryStarted { .. } => {
            Some("Discovering jobs from GitLab API...".to_string())
        }
        RunEvent::PageFetched { .. } if verbose => Some(event.to_string()),
        RunEvent::DiscoveryFinished {
            total,
            cancelled: false,
            ..
        } => Some(format!("✓ Discovered {total} jobs")),
        RunEvent::DiscoveryFinished {
            total,
            cancelled: true,
            ..
        } => Some(format!(
            "Discovery interrupted after {total} jobs, nothing will be deleted"
        )),
        RunEvent::JobFinished { job_id, outcome } => match outcome {
            JobOutcome::Failed(_) => Some(outcome.describe(*job_id)),
            _ if verbose => Some(outcome.describe(*job_id)),
            _ => None,
        },
        RunEvent::JobRetry { .. } if verbose => Some(event.to_string()),
        RunEvent::PageLimitReached { .. }
        | RunEvent::NoJobs
        | RunEvent::DispatchStarted { .. }
        | RunEvent::DispatchStopped { .. }
        | RunEvent::Interrupted
        | RunEvent::Summary(_) => Some(event.to_string()),
        _ => None,
    }
}

/// Console sink for run events.
pub struct ConsoleReporter {
    verbose: bool,
    /// Spinner during discovery, progress bar during deletion.
    progress: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            progress: Mutex::new(None),
        }
    }

    fn print(progress: &Option<ProgressBar>, line: &str) {
        match progress {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    fn finish(progress: &mut Option<ProgressBar>) {
        if let Some(bar) = progress.take() {
            bar.finish_and_clear();
        }
    }
}

impl EventSink for ConsoleReporter {
    fn emit(&self, event: &RunEvent) {
        let mut progress = match self.progress.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match event {
            RunEvent::DiscoveryFinished { .. } | RunEvent::Summary(_) => {
                Self::finish(&mut progress);
            }
            RunEvent::PageFetched { total, .. } if !self.verbose => {
                if let Some(spinner) = progress.as_ref() {
                    spinner.set_message(format!("Fetching jobs... {total} found so far"));
                }
            }
            RunEvent::JobFinished { .. } => {
                if let Some(bar) = progress.as_ref() {
                    bar.inc(1);
                }
            }
            _ => {}
        }

        if let Some(line) = message(event, self.verbose) {
            Self::print(&progress, &line);
        }

        if self.verbose {
            return;
        }
        match event {
            RunEvent::DiscoveryStarted { .. } => {
                *progress = Some(spinner());
            }
            RunEvent::DispatchStarted { total, .. } => {
                Self::finish(&mut progress);
                *progress = Some(bar(*total as u64));
            }
            _ => {}
        }
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
        spinner.set_style(style);
    }
    spinner.set_message("Fetching jobs...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}
