use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::service::{JobRequest, JobService, PollResponse, ServiceError, SubmitResponse};

/// One scripted answer to a poll
#[derive(Debug)]
pub enum PollStep {
    Respond(PollResponse),
    Fail(ServiceError),
}

impl From<PollResponse> for PollStep {
    fn from(response: PollResponse) -> Self {
        Self::Respond(response)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    submits: Vec<JobRequest>,
    polls: Vec<String>,
    cancels: Vec<String>,
}

/// `JobService` that replays a fixed script.
///
/// Submissions return `job_id` (default `"job-1"`) unless a submit error is
/// scripted. Polls pop the next [`PollStep`]; once the script runs out every
/// poll answers `pending` without a retry count.
#[derive(Debug)]
pub struct ScriptedJobService {
    job_id: String,
    submit_error: Mutex<Option<ServiceError>>,
    submit_delay: Duration,
    poll_delay: Duration,
    polls: Mutex<VecDeque<PollStep>>,
    cancel_error: Mutex<Option<ServiceError>>,
    recorded: Mutex<Recorded>,
}

impl Default for ScriptedJobService {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedJobService {
    pub fn new() -> Self {
        Self {
            job_id: "job-1".to_string(),
            submit_error: Mutex::new(None),
            submit_delay: Duration::ZERO,
            poll_delay: Duration::ZERO,
            polls: Mutex::new(VecDeque::new()),
            cancel_error: Mutex::new(None),
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = job_id.into();
        self
    }

    pub fn with_submit_error(self, error: ServiceError) -> Self {
        *self.submit_error.lock() = Some(error);
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn with_polls<S: Into<PollStep>>(self, steps: impl IntoIterator<Item = S>) -> Self {
        self.polls.lock().extend(steps.into_iter().map(Into::into));
        self
    }

    pub fn with_cancel_error(self, error: ServiceError) -> Self {
        *self.cancel_error.lock() = Some(error);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.recorded.lock().submits.len()
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.recorded.lock().submits.clone()
    }

    pub fn poll_calls(&self) -> usize {
        self.recorded.lock().polls.len()
    }

    pub fn cancelled_jobs(&self) -> Vec<String> {
        self.recorded.lock().cancels.clone()
    }
}

#[async_trait]
impl JobService for ScriptedJobService {
    async fn submit(&self, request: &JobRequest) -> Result<SubmitResponse, ServiceError> {
        self.recorded.lock().submits.push(request.clone());
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        let error = self.submit_error.lock().take();
        match error {
            Some(error) => Err(error),
            None => Ok(SubmitResponse::new(self.job_id.clone())),
        }
    }

    async fn poll(&self, job_id: &str) -> Result<PollResponse, ServiceError> {
        self.recorded.lock().polls.push(job_id.to_string());
        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }

        let step = self.polls.lock().pop_front();
        match step {
            Some(PollStep::Respond(response)) => Ok(response),
            Some(PollStep::Fail(error)) => Err(error),
            None => Ok(PollResponse::pending(None)),
        }
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ServiceError> {
        self.recorded.lock().cancels.push(job_id.to_string());
        let error = self.cancel_error.lock().take();
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn service_name(&self) -> &str {
        "scripted"
    }
}
