//! # Job Orchestrator
//!
//! Async driver for one orchestrator instance. Each started run gets its own
//! task that submits the job, then polls it while the progress and label
//! timers tick, until the state machine reaches a terminal phase.
//!
//! All three repeating timers live in a single [`TimerSet`] owned by the run
//! task. They are created together when the job is accepted and dropped
//! together when the machine asks for `StopTimers`, when the run is cancelled,
//! or when it is superseded by a newer run.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{error::Elapsed, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::core::{DriverAction, OrchestratorCore, Outputs, RunChannels};
use super::recovery::ErrorRecoveryController;
use super::run::JobRun;
use crate::config::{OrchestratorConfig, Preset, RuntimeSettings};
use crate::constants::{events, messages};
use crate::error::{ErrorInfo, ErrorKind};
use crate::events::EventPublisher;
use crate::labels::LabelCycler;
use crate::logging::log_error;
use crate::progress::ProgressSnapshot;
use crate::service::{
    JobRequest, JobResult, JobService, JobStatus, PollResponse, ServiceError, SubmitResponse,
};
use crate::state_machine::{JobStateMachine, OrchestratorEvent, OrchestratorPhase, OrchestratorState};
use crate::validation::validate_request;

type PollOutcome = Result<Result<PollResponse, ServiceError>, Elapsed>;

struct ActiveRun {
    run_id: Uuid,
    cancel: CancellationToken,
}

/// Client-side orchestrator for long-running generation jobs.
///
/// One instance drives at most one run at a time. Starting a new run
/// supersedes the previous one; dropping the orchestrator tears it down.
pub struct JobOrchestrator {
    config: OrchestratorConfig,
    service: Arc<dyn JobService>,
    request_timeout: Duration,
    core: Arc<Mutex<OrchestratorCore>>,
    publisher: EventPublisher,
    recovery: ErrorRecoveryController,
    state_rx: watch::Receiver<OrchestratorState>,
    label_rx: watch::Receiver<String>,
    progress_rx: watch::Receiver<Option<ProgressSnapshot>>,
    active: Option<ActiveRun>,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("preset", &self.config.preset)
            .field("service", &self.service.service_name())
            .field("phase", &self.phase())
            .field("active_run", &self.active.as_ref().map(|a| a.run_id))
            .finish()
    }
}

impl JobOrchestrator {
    pub fn new(
        service: Arc<dyn JobService>,
        preset: Preset,
        settings: &RuntimeSettings,
        publisher: EventPublisher,
    ) -> Self {
        let config = OrchestratorConfig::for_preset(preset);
        let labels = LabelCycler::new(settings.labels.for_preset(preset).to_vec());
        let recovery = ErrorRecoveryController::new(config.validation_display);

        let (state_tx, state_rx) = watch::channel(OrchestratorState::Idle);
        let (label_tx, label_rx) = watch::channel(labels.current().to_string());
        let (progress_tx, progress_rx) = watch::channel(None);

        let core = OrchestratorCore::new(
            JobStateMachine::new(config.clone()),
            labels,
            Outputs {
                state: state_tx,
                label: label_tx,
                progress: progress_tx,
            },
            publisher.clone(),
            recovery.clone(),
        );

        info!(
            preset = %preset,
            service = service.service_name(),
            max_attempts = config.max_attempts,
            "Job orchestrator created"
        );

        Self {
            config,
            service,
            request_timeout: settings.request_timeout(),
            core: Arc::new(Mutex::new(core)),
            publisher,
            recovery,
            state_rx,
            label_rx,
            progress_rx,
            active: None,
        }
    }

    /// Validate `request` and start a run for it.
    ///
    /// Invalid input is rejected without contacting the job service and
    /// without disturbing a run already in progress. Any other run is
    /// superseded and resolves as cancelled. Must be called from within a
    /// Tokio runtime.
    pub fn start(&mut self, request: JobRequest) -> Result<JobRun, ErrorInfo> {
        if let Err(info) = validate_request(&request) {
            debug!(preset = %self.config.preset, reason = %info.message, "Rejected job request");
            self.publisher.publish(
                events::JOB_VALIDATION_REJECTED,
                Uuid::nil(),
                request.kind,
                None,
                json!({ "message": info.message }),
            );
            self.recovery.present(info.clone());
            return Err(info);
        }

        if request.kind.preset() != self.config.preset {
            warn!(
                preset = %self.config.preset,
                kind = %request.kind,
                "Job kind belongs to a different preset"
            );
        }

        self.stop_active();

        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let run_id = self.core.lock().begin_run(
            request.kind,
            RunChannels {
                snapshots: snapshot_tx,
                outcome: outcome_tx,
            },
            Instant::now(),
        );

        let cancel = CancellationToken::new();
        let context = RunContext {
            run_id,
            request,
            service: Arc::clone(&self.service),
            core: Arc::clone(&self.core),
            config: self.config.clone(),
            request_timeout: self.request_timeout,
        };
        tokio::spawn(drive(context, cancel.clone()));

        self.active = Some(ActiveRun { run_id, cancel });
        Ok(JobRun::new(run_id, snapshot_rx, outcome_rx))
    }

    /// Cancel the live run and ask the job service to stop its job.
    ///
    /// Only a run that is still submitting or polling can be cancelled; it
    /// resolves as cancelled and the orchestrator returns to `Idle`. Once
    /// success is confirmed the call does nothing. A failing remote cancel is
    /// logged and otherwise ignored.
    pub async fn cancel(&mut self) {
        let job_id = {
            let mut core = self.core.lock();
            if !core.is_cancellable() {
                debug!(phase = %self.phase(), "Nothing to cancel");
                return;
            }
            core.abandon(ErrorInfo::cancelled(messages::JOB_CANCELLED), Instant::now())
        };
        self.stop_active();

        let Some(job_id) = job_id else {
            return;
        };

        match tokio::time::timeout(self.request_timeout, self.service.cancel(&job_id)).await {
            Ok(Ok(())) => info!(job_id = %job_id, "Remote job cancelled"),
            Ok(Err(err)) => log_error(
                "job_orchestrator",
                "cancel",
                &err.to_string(),
                Some(&job_id),
            ),
            Err(_) => log_error(
                "job_orchestrator",
                "cancel",
                messages::REQUEST_TIMED_OUT,
                Some(&job_id),
            ),
        }
    }

    /// Stop everything and return to `Idle`.
    ///
    /// Used when the owning screen goes away. The live run, if any, resolves
    /// as cancelled; the remote job is left alone.
    pub fn teardown(&mut self) {
        {
            let mut core = self.core.lock();
            core.abandon(ErrorInfo::cancelled(messages::RUN_TORN_DOWN), Instant::now());
            core.reset(Instant::now());
        }
        self.stop_active();
        self.recovery.clear();
    }

    /// Replace a terminal state with `Idle`
    pub fn acknowledge(&mut self) {
        let mut core = self.core.lock();
        if core.is_terminal() {
            core.reset(Instant::now());
            self.recovery.clear();
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state_rx.borrow().clone()
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.state_rx.borrow().phase()
    }

    pub fn current_label(&self) -> String {
        self.label_rx.borrow().clone()
    }

    pub fn progress(&self) -> Option<ProgressSnapshot> {
        *self.progress_rx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<OrchestratorState> {
        self.state_rx.clone()
    }

    pub fn subscribe_label(&self) -> watch::Receiver<String> {
        self.label_rx.clone()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Option<ProgressSnapshot>> {
        self.progress_rx.clone()
    }

    pub fn recovery(&self) -> &ErrorRecoveryController {
        &self.recovery
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Whether the poll, progress and label timers of a run are live
    pub fn has_active_timers(&self) -> bool {
        self.core.lock().timers_active()
    }

    fn stop_active(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(run_id = %active.run_id, "Stopping run driver");
            active.cancel.cancel();
        }
    }
}

impl Drop for JobOrchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Everything a run task needs, detached from the orchestrator
struct RunContext {
    run_id: Uuid,
    request: JobRequest,
    service: Arc<dyn JobService>,
    core: Arc<Mutex<OrchestratorCore>>,
    config: OrchestratorConfig,
    request_timeout: Duration,
}

/// The three repeating timers of a polling run
struct TimerSet {
    poll: Interval,
    progress: Interval,
    label: Interval,
}

impl TimerSet {
    fn start(config: &OrchestratorConfig) -> Self {
        Self {
            poll: repeating(config.poll_interval),
            progress: repeating(config.progress_tick),
            label: repeating(config.label_cycle),
        }
    }
}

fn repeating(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

enum Wake {
    PollDue,
    PollReturned(PollOutcome),
    Progress,
    Label,
}

async fn await_in_flight(in_flight: &mut Option<BoxFuture<'static, PollOutcome>>) -> PollOutcome {
    match in_flight {
        Some(request) => request.await,
        None => std::future::pending().await,
    }
}

async fn drive(context: RunContext, cancel: CancellationToken) {
    let run_id = context.run_id;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => debug!(run_id = %run_id, "Run driver cancelled"),
        _ = context.run() => debug!(run_id = %run_id, "Run driver finished"),
    }
}

impl RunContext {
    async fn run(&self) {
        let event = self.submit().await;
        let job_id = match &event {
            OrchestratorEvent::Submitted { job_id } => Some(job_id.clone()),
            _ => None,
        };

        let Some(actions) = self.dispatch(event) else {
            return;
        };
        let Some(job_id) = job_id else {
            return;
        };
        if !actions.contains(&DriverAction::StartTimers) {
            return;
        }

        self.poll_until_settled(job_id).await;
    }

    async fn submit(&self) -> OrchestratorEvent {
        let submitted =
            tokio::time::timeout(self.request_timeout, self.service.submit(&self.request)).await;

        match submitted {
            Ok(Ok(response)) => {
                self.log_submit_hint(&response);
                OrchestratorEvent::Submitted {
                    job_id: response.job_id,
                }
            }
            Ok(Err(err)) => {
                warn!(run_id = %self.run_id, error = %err, "Job submission failed");
                log_error("job_orchestrator", "submit", &err.to_string(), None);
                OrchestratorEvent::SubmitFailed(ErrorInfo::network(messages::NETWORK_FAILURE))
            }
            Err(_) => {
                warn!(
                    run_id = %self.run_id,
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "Job submission timed out"
                );
                OrchestratorEvent::SubmitFailed(ErrorInfo::network(messages::REQUEST_TIMED_OUT))
            }
        }
    }

    fn log_submit_hint(&self, response: &SubmitResponse) {
        debug!(
            run_id = %self.run_id,
            job_id = %response.job_id,
            status = ?response.status,
            message = ?response.message,
            polling_interval = ?response.polling_interval,
            "Job service accepted submission"
        );
    }

    async fn poll_until_settled(&self, job_id: String) {
        let mut timers = TimerSet::start(&self.config);
        let mut in_flight: Option<BoxFuture<'static, PollOutcome>> = None;

        let actions = loop {
            let poll_ready = in_flight.is_none();
            let wake = tokio::select! {
                biased;
                outcome = await_in_flight(&mut in_flight) => Wake::PollReturned(outcome),
                _ = timers.poll.tick(), if poll_ready => Wake::PollDue,
                _ = timers.progress.tick() => Wake::Progress,
                _ = timers.label.tick() => Wake::Label,
            };

            let event = match wake {
                Wake::PollDue => {
                    in_flight = Some(self.poll_request(&job_id));
                    continue;
                }
                Wake::PollReturned(outcome) => {
                    in_flight = None;
                    self.poll_event(&job_id, outcome)
                }
                Wake::Progress => OrchestratorEvent::ProgressTick,
                Wake::Label => OrchestratorEvent::LabelTick,
            };

            let Some(actions) = self.dispatch(event) else {
                return;
            };
            if actions.contains(&DriverAction::StopTimers) {
                break actions;
            }
        };

        drop(in_flight);
        drop(timers);

        for action in actions {
            if let DriverAction::ScheduleSettle(delay) = action {
                tokio::time::sleep(delay).await;
                self.dispatch(OrchestratorEvent::SettleElapsed);
            }
        }
    }

    fn poll_request(&self, job_id: &str) -> BoxFuture<'static, PollOutcome> {
        let service = Arc::clone(&self.service);
        let job_id = job_id.to_string();
        let timeout = self.request_timeout;
        Box::pin(async move { tokio::time::timeout(timeout, service.poll(&job_id)).await })
    }

    fn poll_event(&self, job_id: &str, outcome: PollOutcome) -> OrchestratorEvent {
        match outcome {
            Ok(Ok(response)) => self.status_event(job_id, response),
            Ok(Err(err)) => {
                warn!(run_id = %self.run_id, job_id = %job_id, error = %err, "Poll request failed");
                log_error("job_orchestrator", "poll", &err.to_string(), Some(job_id));
                OrchestratorEvent::PollFailed(ErrorInfo::with_fallback(
                    ErrorKind::Network,
                    err.server_message(),
                    messages::NETWORK_FAILURE,
                ))
            }
            Err(_) => {
                warn!(run_id = %self.run_id, job_id = %job_id, "Poll request timed out");
                OrchestratorEvent::PollFailed(ErrorInfo::network(messages::REQUEST_TIMED_OUT))
            }
        }
    }

    fn status_event(&self, job_id: &str, response: PollResponse) -> OrchestratorEvent {
        debug!(
            run_id = %self.run_id,
            job_id = %job_id,
            status = ?response.status,
            retry_count = ?response.retry_count,
            server_progress = ?response.progress,
            "Poll response"
        );

        match response.status {
            JobStatus::Pending | JobStatus::Processing => OrchestratorEvent::PollPending {
                retry_count: response.retry_count,
            },
            JobStatus::Completed => OrchestratorEvent::PollCompleted(JobResult {
                job_id: job_id.to_string(),
                kind: self.request.kind,
                recipe_id: response.recipe_id,
                payload: response.result.unwrap_or(Value::Null),
            }),
            JobStatus::Failed => OrchestratorEvent::PollFailed(ErrorInfo::with_fallback(
                ErrorKind::JobFailed,
                response.error.as_deref(),
                messages::JOB_FAILED,
            )),
            JobStatus::Cancelled => OrchestratorEvent::PollFailed(ErrorInfo::with_fallback(
                ErrorKind::Cancelled,
                response.error.as_deref(),
                messages::JOB_CANCELLED,
            )),
        }
    }

    fn dispatch(&self, event: OrchestratorEvent) -> Option<Vec<DriverAction>> {
        self.core.lock().dispatch(self.run_id, event, Instant::now())
    }
}
