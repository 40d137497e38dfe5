//! Shared fakes for pipeline integration tests.
//!
//! [`FakeGitLab`] is an in-memory [`GitLabClient`] with scripted replies,
//! call counters, and an in-flight gauge for checking the concurrency
//! bound. [`RecordingSink`] captures every emitted [`RunEvent`] and can
//! trigger cancellation when a chosen event arrives.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sweeper_core::{Job, JobId, JobOutcome, ProjectId};
use sweeper_events::{EventSink, RunEvent};
use sweeper_gitlab::{GitLabApiError, GitLabClient, StatusCode};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// FakeGitLab
// ---------------------------------------------------------------------------

/// One scripted answer from the fake server.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Status(u16),
    /// No response at all (connection reset, timeout, ...).
    TransportError,
}

impl Reply {
    fn into_result(self) -> Result<StatusCode, GitLabApiError> {
        match self {
            Reply::Status(code) => Ok(StatusCode::from_u16(code).unwrap()),
            Reply::TransportError => Err(GitLabApiError::Connection(
                "connection reset by peer".to_string(),
            )),
        }
    }
}

pub struct FakeGitLab {
    projects: HashMap<ProjectId, Reply>,
    pages: Vec<Result<Vec<Job>, u16>>,
    scripts: Mutex<HashMap<JobId, VecDeque<Reply>>>,
    replies: HashMap<JobId, Reply>,
    default_reply: Reply,
    latency: Duration,

    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    project_calls: AtomicUsize,
    list_calls: Mutex<Vec<(u32, u32)>>,
    delete_calls: Mutex<Vec<JobId>>,
}

impl Default for FakeGitLab {
    fn default() -> Self {
        Self {
            projects: HashMap::new(),
            pages: Vec::new(),
            scripts: Mutex::new(HashMap::new()),
            replies: HashMap::new(),
            default_reply: Reply::Status(204),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            project_calls: AtomicUsize::new(0),
            list_calls: Mutex::new(Vec::new()),
            delete_calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGitLab {
    /// A server where project 1 exists and every delete returns 204.
    pub fn new() -> Self {
        Self::default().with_project(1, Reply::Status(200))
    }

    pub fn with_project(mut self, project_id: ProjectId, reply: Reply) -> Self {
        self.projects.insert(project_id, reply);
        self
    }

    /// Listing pages, in order. Requests past the end get an empty page.
    pub fn with_pages(mut self, pages: Vec<Result<Vec<Job>, u16>>) -> Self {
        self.pages = pages;
        self
    }

    /// `total` jobs with IDs `1..=total`, split into pages of `per_page`.
    pub fn with_job_count(self, total: i64, per_page: usize) -> Self {
        let jobs: Vec<Job> = (1..=total).map(Job::from_id).collect();
        let pages = jobs.chunks(per_page).map(|c| Ok(c.to_vec())).collect();
        self.with_pages(pages)
    }

    /// Every delete for `job_id` gets `reply` (after any script runs out).
    pub fn with_reply(mut self, job_id: JobId, reply: Reply) -> Self {
        self.replies.insert(job_id, reply);
        self
    }

    /// Successive deletes for `job_id` get these replies, in order.
    pub fn with_script(self, job_id: JobId, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id, replies.into_iter().collect());
        self
    }

    pub fn with_default_reply(mut self, reply: Reply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Simulated round-trip time for every delete.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn project_calls(&self) -> usize {
        self.project_calls.load(Ordering::SeqCst)
    }

    /// `(page, per_page)` of every listing request.
    pub fn list_calls(&self) -> Vec<(u32, u32)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<JobId> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub fn delete_calls_for(&self, job_id: JobId) -> usize {
        self.delete_calls().iter().filter(|&&id| id == job_id).count()
    }

    fn next_reply(&self, job_id: JobId) -> Reply {
        if let Some(reply) = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&job_id)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.replies
            .get(&job_id)
            .copied()
            .unwrap_or(self.default_reply)
    }
}

#[async_trait]
impl GitLabClient for FakeGitLab {
    async fn project_status(&self, project_id: ProjectId) -> Result<StatusCode, GitLabApiError> {
        self.project_calls.fetch_add(1, Ordering::SeqCst);
        self.projects
            .get(&project_id)
            .copied()
            .unwrap_or(Reply::Status(404))
            .into_result()
    }

    async fn list_jobs(
        &self,
        _project_id: ProjectId,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Job>, GitLabApiError> {
        self.list_calls.lock().unwrap().push((page, per_page));
        match self.pages.get(page as usize - 1) {
            Some(Ok(jobs)) => Ok(jobs.clone()),
            Some(Err(status)) => Err(GitLabApiError::Api {
                status: *status,
                body: "listing failed".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn delete_artifacts(
        &self,
        _project_id: ProjectId,
        job_id: JobId,
    ) -> Result<StatusCode, GitLabApiError> {
        self.delete_calls.lock().unwrap().push(job_id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = self.next_reply(job_id);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.into_result()
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// When to trigger the sink's cancellation token.
pub enum CancelOn {
    Never,
    /// After the n-th `JobFinished` event.
    Outcomes(usize),
    /// On the first `JobRetry` event.
    FirstRetry,
}

pub struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
    cancel: CancellationToken,
    cancel_on: CancelOn,
    outcomes: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::cancelling(CancellationToken::new(), CancelOn::Never)
    }

    pub fn cancelling(cancel: CancellationToken, cancel_on: CancelOn) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel,
            cancel_on,
            outcomes: AtomicUsize::new(0),
        }
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<(JobId, JobOutcome)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::JobFinished { job_id, outcome } => Some((job_id, outcome)),
                _ => None,
            })
            .collect()
    }

    pub fn retry_delays(&self, job_id: JobId) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::JobRetry {
                    job_id: id, delay, ..
                } if id == job_id => Some(delay),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, predicate: impl Fn(&RunEvent) -> bool) -> bool {
        self.events().iter().any(predicate)
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
        match (&self.cancel_on, event) {
            (CancelOn::Outcomes(n), RunEvent::JobFinished { .. }) => {
                if self.outcomes.fetch_add(1, Ordering::SeqCst) + 1 >= *n {
                    self.cancel.cancel();
                }
            }
            (CancelOn::FirstRetry, RunEvent::JobRetry { .. }) => self.cancel.cancel(),
            _ => {}
        }
    }
}
