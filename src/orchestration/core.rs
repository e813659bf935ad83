//! Shared orchestrator core
//!
//! Holds the state machine, the label cycler and every output channel behind
//! one lock. A dispatch applies an event and all of its effects before the
//! lock is released, so a stopped cycler can never be rotated by a tick that
//! was already queued.

use serde_json::json;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::recovery::ErrorRecoveryController;
use crate::config::Preset;
use crate::constants::{events, messages};
use crate::error::{ErrorInfo, ErrorKind};
use crate::events::EventPublisher;
use crate::labels::LabelCycler;
use crate::logging::log_job_operation;
use crate::progress::ProgressSnapshot;
use crate::service::{JobKind, JobResult};
use crate::state_machine::{Effect, JobStateMachine, OrchestratorEvent, OrchestratorState};

pub(crate) type RunOutcome = Result<JobResult, ErrorInfo>;

/// Per-run output channels, dropped together when the run resolves
pub(crate) struct RunChannels {
    pub snapshots: mpsc::UnboundedSender<ProgressSnapshot>,
    pub outcome: oneshot::Sender<RunOutcome>,
}

/// Work the async driver must do after a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriverAction {
    StartTimers,
    StopTimers,
    ScheduleSettle(Duration),
}

/// Watch channels the UI layer subscribes to
pub(crate) struct Outputs {
    pub state: watch::Sender<OrchestratorState>,
    pub label: watch::Sender<String>,
    pub progress: watch::Sender<Option<ProgressSnapshot>>,
}

pub(crate) struct OrchestratorCore {
    machine: JobStateMachine,
    labels: LabelCycler,
    run_id: Option<Uuid>,
    kind: JobKind,
    /// Server job of the current run, kept after the handle is discarded
    current_job: Option<String>,
    channels: Option<RunChannels>,
    /// Whether the poll, progress and label timers of the current run are live
    timers_active: bool,
    outputs: Outputs,
    publisher: EventPublisher,
    recovery: ErrorRecoveryController,
}

impl OrchestratorCore {
    pub fn new(
        machine: JobStateMachine,
        labels: LabelCycler,
        outputs: Outputs,
        publisher: EventPublisher,
        recovery: ErrorRecoveryController,
    ) -> Self {
        let kind = match machine.config().preset {
            Preset::Generation => JobKind::RecipeGeneration,
            Preset::Ideation => JobKind::Ideation,
        };
        Self {
            machine,
            labels,
            run_id: None,
            kind,
            current_job: None,
            channels: None,
            timers_active: false,
            outputs,
            publisher,
            recovery,
        }
    }

    /// Start a new run, superseding whatever is in flight
    pub fn begin_run(&mut self, kind: JobKind, channels: RunChannels, now: Instant) -> Uuid {
        if self.machine.state().is_active() {
            self.abandon(ErrorInfo::cancelled(messages::RUN_SUPERSEDED), now);
        }
        self.reset(now);
        self.recovery.clear();

        let run_id = Uuid::new_v4();
        self.run_id = Some(run_id);
        self.kind = kind;
        self.current_job = None;
        self.channels = Some(channels);
        self.outputs.progress.send_replace(None);

        if let Err(err) = self.machine.apply(OrchestratorEvent::Submit, now) {
            warn!(run_id = %run_id, error = %err, "Failed to enter submitting phase");
        }
        self.publish_state();

        debug!(run_id = %run_id, kind = %kind, "Run started");
        run_id
    }

    /// Apply an event on behalf of `run_id`.
    ///
    /// Returns `None` when the run is no longer current; the caller must stop.
    pub fn dispatch(
        &mut self,
        run_id: Uuid,
        event: OrchestratorEvent,
        now: Instant,
    ) -> Option<Vec<DriverAction>> {
        if self.run_id != Some(run_id) {
            debug!(
                run_id = %run_id,
                event = event.event_type(),
                "Dropping event for stale run"
            );
            return None;
        }

        let effects = match self.machine.apply(event, now) {
            Ok(effects) => effects,
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "Rejected orchestrator event");
                return Some(Vec::new());
            }
        };

        let actions = self.apply_effects(effects);
        self.publish_state();
        Some(actions)
    }

    /// Tear down the live run, resolving it with `error`.
    ///
    /// Returns the id of the server job that was live, if any.
    pub fn abandon(&mut self, error: ErrorInfo, now: Instant) -> Option<String> {
        let job_id = self.job_id();

        if self.machine.state().is_active() {
            self.reset(now);
            self.resolve(Err(error));
        }

        self.run_id = None;
        self.channels = None;
        job_id
    }

    /// Return to `Idle` from any phase
    pub fn reset(&mut self, now: Instant) {
        match self.machine.apply(OrchestratorEvent::Reset, now) {
            Ok(effects) => {
                self.apply_effects(effects);
            }
            Err(err) => warn!(error = %err, "Reset rejected"),
        }
        self.timers_active = false;
        let label = self.labels.reset().to_string();
        self.outputs.label.send_replace(label);
        self.publish_state();
    }

    pub fn is_terminal(&self) -> bool {
        self.machine.state().is_terminal()
    }

    /// Whether the live run can still be abandoned along with its server job
    pub fn is_cancellable(&self) -> bool {
        self.machine.phase().is_cancellable()
    }

    pub fn timers_active(&self) -> bool {
        self.timers_active
    }

    fn job_id(&self) -> Option<String> {
        self.machine.state().job_handle().map(|h| h.id.clone())
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) -> Vec<DriverAction> {
        let mut actions = Vec::new();

        for effect in effects {
            match effect {
                Effect::StartTimers => {
                    let label = self.labels.start().to_string();
                    self.outputs.label.send_replace(label);
                    self.on_submitted();
                    self.timers_active = true;
                    actions.push(DriverAction::StartTimers);
                }
                Effect::StopTimers => {
                    self.labels.stop();
                    self.timers_active = false;
                    actions.push(DriverAction::StopTimers);
                }
                Effect::EmitSnapshot(snapshot) => {
                    if let Some(channels) = &self.channels {
                        let _ = channels.snapshots.send(snapshot);
                    }
                    self.outputs.progress.send_replace(Some(snapshot));
                }
                Effect::AttemptAdvanced { attempt } => self.on_attempt_advanced(attempt),
                Effect::RotateLabel => {
                    if let Some(label) = self.labels.advance() {
                        let label = label.to_string();
                        self.outputs.label.send_replace(label);
                    }
                }
                Effect::FinishLabel(label) => {
                    let label = self.labels.finish(label).to_string();
                    self.outputs.label.send_replace(label);
                }
                Effect::ScheduleSettle(delay) => actions.push(DriverAction::ScheduleSettle(delay)),
                Effect::Resolve(outcome) => self.resolve(outcome),
            }
        }

        actions
    }

    fn on_submitted(&mut self) {
        let Some(run_id) = self.run_id else {
            return;
        };
        let job_id = self.job_id();
        self.current_job = job_id.clone();
        info!(run_id = %run_id, kind = %self.kind, job_id = ?job_id, "Job submitted");
        log_job_operation(
            "submit",
            &self.kind.to_string(),
            job_id.as_deref(),
            "accepted",
            None,
        );
        self.publisher.publish(
            events::JOB_SUBMITTED,
            run_id,
            self.kind,
            job_id.as_deref(),
            json!({ "max_attempts": self.machine.config().max_attempts }),
        );
    }

    fn on_attempt_advanced(&self, attempt: u32) {
        let Some(run_id) = self.run_id else {
            return;
        };
        let job_id = self.job_id();
        info!(run_id = %run_id, job_id = ?job_id, attempt, "Server started a new attempt");
        self.publisher.publish(
            events::JOB_ATTEMPT_ADVANCED,
            run_id,
            self.kind,
            job_id.as_deref(),
            json!({
                "attempt": attempt,
                "max_attempts": self.machine.config().max_attempts,
            }),
        );
    }

    fn resolve(&mut self, outcome: RunOutcome) {
        if let Some(run_id) = self.run_id {
            match &outcome {
                Ok(result) => {
                    log_job_operation(
                        "resolve",
                        &self.kind.to_string(),
                        Some(&result.job_id),
                        "succeeded",
                        None,
                    );
                    self.publisher.publish(
                        events::JOB_SUCCEEDED,
                        run_id,
                        self.kind,
                        Some(&result.job_id),
                        json!({ "recipe_id": result.recipe_id }),
                    );
                }
                Err(error) if error.kind != ErrorKind::Cancelled => {
                    log_job_operation(
                        "resolve",
                        &self.kind.to_string(),
                        self.current_job.as_deref(),
                        "failed",
                        Some(&error.message),
                    );
                    self.publisher.publish(
                        events::JOB_FAILED,
                        run_id,
                        self.kind,
                        self.current_job.as_deref(),
                        json!({ "kind": error.kind, "message": error.message }),
                    );
                    self.recovery.present(error.clone());
                }
                Err(error) => {
                    info!(run_id = %run_id, job_id = ?self.current_job, reason = %error.message, "Run cancelled");
                    self.publisher.publish(
                        events::JOB_CANCELLED,
                        run_id,
                        self.kind,
                        self.current_job.as_deref(),
                        json!({ "reason": error.message }),
                    );
                }
            }
        }

        if let Some(channels) = self.channels.take() {
            let _ = channels.outcome.send(outcome);
        }
    }

    fn publish_state(&self) {
        self.outputs.state.send_replace(self.machine.state().clone());
    }
}
