use tokio::time::Instant;
use tracing::debug;

use super::{
    effects::Effect,
    errors::{StateMachineError, StateMachineResult},
    events::OrchestratorEvent,
    states::{JobHandle, OrchestratorPhase, OrchestratorState, PollingState},
};
use crate::config::{OrchestratorConfig, Preset};
use crate::constants::labels;
use crate::progress::{AttemptState, AttemptTracker, ProgressEstimator, ProgressSnapshot};

/// Reducer for one orchestrator.
///
/// Every event is applied as a single update that returns the effects the
/// driver must carry out. Timer events arriving outside the phase that owns
/// the timer are inert: they change nothing and produce no effects.
#[derive(Debug, Clone)]
pub struct JobStateMachine {
    config: OrchestratorConfig,
    tracker: AttemptTracker,
    estimator: ProgressEstimator,
    state: OrchestratorState,
}

impl JobStateMachine {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            tracker: AttemptTracker::new(config.max_attempts),
            estimator: ProgressEstimator::new(config.max_attempts, config.segment_duration),
            config,
            state: OrchestratorState::Idle,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.state.phase()
    }

    /// Progress as of `now`, if the phase has any
    pub fn snapshot(&self, now: Instant) -> Option<ProgressSnapshot> {
        match &self.state {
            OrchestratorState::Polling(polling) => {
                let mut attempt = polling.attempt;
                self.estimator.refresh(&mut attempt, now);
                Some(self.estimator.snapshot(&attempt))
            }
            state => state
                .settled_attempt()
                .map(|attempt_number| self.estimator.completed(attempt_number)),
        }
    }

    /// Apply an event and return the effects to carry out
    pub fn apply(
        &mut self,
        event: OrchestratorEvent,
        now: Instant,
    ) -> StateMachineResult<Vec<Effect>> {
        let current = self.phase();
        let Some(target) = Self::determine_target_phase(current, &event)? else {
            return Ok(Vec::new());
        };

        let event_type = event.event_type();
        let previous = std::mem::take(&mut self.state);
        let (next, effects) = self.execute(previous, event, now);
        self.state = next;

        debug!(
            preset = %self.config.preset,
            from = %current,
            to = %target,
            event = event_type,
            effects = effects.len(),
            "Orchestrator transition"
        );

        Ok(effects)
    }

    /// Decide where an event leads; `None` means the event is inert here
    fn determine_target_phase(
        current: OrchestratorPhase,
        event: &OrchestratorEvent,
    ) -> StateMachineResult<Option<OrchestratorPhase>> {
        use OrchestratorEvent as E;
        use OrchestratorPhase as P;

        let target = match (current, event) {
            (_, E::Reset) => P::Idle,

            (phase, E::Submit) if phase.accepts_submit() => P::Submitting,

            (P::Submitting, E::Submitted { .. }) => P::Polling,
            (P::Submitting, E::SubmitFailed(_)) => P::Failed,

            (P::Polling, E::PollPending { .. }) => P::Polling,
            (P::Polling, E::PollCompleted(_)) => P::SucceedingAnimation,
            (P::Polling, E::PollFailed(_)) => P::Failed,
            (P::Polling, E::ProgressTick | E::LabelTick) => P::Polling,

            (P::SucceedingAnimation, E::SettleElapsed) => P::Succeeded,

            // Late timer ticks after the owning phase has ended
            (_, E::ProgressTick | E::LabelTick | E::SettleElapsed) => return Ok(None),

            (from, event) => {
                return Err(StateMachineError::InvalidTransition {
                    from,
                    event: event.event_type(),
                })
            }
        };

        Ok(Some(target))
    }

    fn execute(
        &self,
        previous: OrchestratorState,
        event: OrchestratorEvent,
        now: Instant,
    ) -> (OrchestratorState, Vec<Effect>) {
        use OrchestratorEvent as E;
        use OrchestratorState as S;

        match (previous, event) {
            (previous, E::Reset) => {
                let effects = if previous.is_active() {
                    vec![Effect::StopTimers]
                } else {
                    Vec::new()
                };
                (S::Idle, effects)
            }

            (_, E::Submit) => (S::Submitting, Vec::new()),

            (S::Submitting, E::Submitted { job_id }) => {
                let attempt = AttemptState::first(now);
                let snapshot = self.estimator.snapshot(&attempt);
                let polling = PollingState {
                    handle: JobHandle::new(job_id),
                    attempt,
                };
                (
                    S::Polling(polling),
                    vec![Effect::StartTimers, Effect::EmitSnapshot(snapshot)],
                )
            }

            (S::Submitting, E::SubmitFailed(info)) => {
                let effects = vec![
                    Effect::StopTimers,
                    Effect::FinishLabel(info.message.clone()),
                    Effect::Resolve(Err(info.clone())),
                ];
                (S::Failed(info), effects)
            }

            (S::Polling(mut polling), E::PollPending { retry_count }) => {
                let mut effects = Vec::with_capacity(2);
                if self
                    .tracker
                    .observe(&mut polling.attempt, retry_count, now)
                {
                    effects.push(Effect::AttemptAdvanced {
                        attempt: polling.attempt.attempt_number,
                    });
                }
                self.estimator.refresh(&mut polling.attempt, now);
                effects.push(Effect::EmitSnapshot(
                    self.estimator.snapshot(&polling.attempt),
                ));
                (S::Polling(polling), effects)
            }

            (S::Polling(polling), E::PollCompleted(result)) => {
                let attempt_number = polling.attempt.attempt_number;
                let effects = vec![
                    Effect::StopTimers,
                    Effect::EmitSnapshot(self.estimator.completed(attempt_number)),
                    Effect::FinishLabel(self.success_label().to_string()),
                    Effect::ScheduleSettle(self.config.success_settle),
                ];
                (
                    S::SucceedingAnimation {
                        handle: polling.handle,
                        result,
                        attempt_number,
                    },
                    effects,
                )
            }

            (S::Polling(_), E::PollFailed(info)) => {
                let effects = vec![
                    Effect::StopTimers,
                    Effect::FinishLabel(info.message.clone()),
                    Effect::Resolve(Err(info.clone())),
                ];
                (S::Failed(info), effects)
            }

            (S::Polling(mut polling), E::ProgressTick) => {
                self.estimator.refresh(&mut polling.attempt, now);
                let snapshot = self.estimator.snapshot(&polling.attempt);
                (S::Polling(polling), vec![Effect::EmitSnapshot(snapshot)])
            }

            (S::Polling(polling), E::LabelTick) => (S::Polling(polling), vec![Effect::RotateLabel]),

            (
                S::SucceedingAnimation {
                    result,
                    attempt_number,
                    ..
                },
                E::SettleElapsed,
            ) => {
                let effects = vec![Effect::Resolve(Ok(result.clone()))];
                (
                    S::Succeeded {
                        result,
                        attempt_number,
                    },
                    effects,
                )
            }

            // determine_target_phase admits nothing else
            (previous, _) => (previous, Vec::new()),
        }
    }

    fn success_label(&self) -> &'static str {
        match self.config.preset {
            Preset::Generation => labels::GENERATION_DONE,
            Preset::Ideation => labels::IDEATION_DONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorInfo, ErrorKind};
    use crate::service::{JobKind, JobResult};
    use serde_json::json;
    use std::time::Duration;

    fn machine() -> JobStateMachine {
        JobStateMachine::new(OrchestratorConfig::generation())
    }

    fn result() -> JobResult {
        JobResult {
            job_id: "job-1".to_string(),
            kind: JobKind::RecipeGeneration,
            recipe_id: Some("7".to_string()),
            payload: json!({"title": "Shakshuka"}),
        }
    }

    fn polling(sm: &mut JobStateMachine, now: Instant) {
        sm.apply(OrchestratorEvent::Submit, now).unwrap();
        sm.apply(
            OrchestratorEvent::Submitted {
                job_id: "job-1".to_string(),
            },
            now,
        )
        .unwrap();
    }

    #[test]
    fn test_submission_starts_timers() {
        let mut sm = machine();
        let now = Instant::now();
        assert!(sm.apply(OrchestratorEvent::Submit, now).unwrap().is_empty());
        assert_eq!(sm.phase(), OrchestratorPhase::Submitting);

        let effects = sm
            .apply(
                OrchestratorEvent::Submitted {
                    job_id: "job-1".to_string(),
                },
                now,
            )
            .unwrap();
        assert_eq!(effects[0], Effect::StartTimers);
        assert!(matches!(effects[1], Effect::EmitSnapshot(s) if s.overall == 0.0 && s.attempt_number == 1));
        assert_eq!(sm.state().job_handle().map(|h| h.id.as_str()), Some("job-1"));
    }

    #[test]
    fn test_submit_failure_skips_polling() {
        let mut sm = machine();
        let now = Instant::now();
        sm.apply(OrchestratorEvent::Submit, now).unwrap();
        let effects = sm
            .apply(
                OrchestratorEvent::SubmitFailed(ErrorInfo::network("offline")),
                now,
            )
            .unwrap();

        assert!(effects[0].is_stop());
        assert_eq!(sm.phase(), OrchestratorPhase::Failed);
        assert_eq!(sm.state().error().map(|e| e.kind), Some(ErrorKind::Network));
    }

    #[test]
    fn test_terminal_transitions_stop_timers_first() {
        let now = Instant::now();

        let mut sm = machine();
        polling(&mut sm, now);
        let effects = sm
            .apply(OrchestratorEvent::PollCompleted(result()), now)
            .unwrap();
        assert!(effects[0].is_stop());
        assert!(matches!(effects[1], Effect::EmitSnapshot(s) if s.overall == 1.0));
        assert_eq!(
            effects[3],
            Effect::ScheduleSettle(Duration::from_millis(300))
        );
        assert_eq!(sm.phase(), OrchestratorPhase::SucceedingAnimation);

        let mut sm = machine();
        polling(&mut sm, now);
        let effects = sm
            .apply(
                OrchestratorEvent::PollFailed(ErrorInfo::job_failed("X")),
                now,
            )
            .unwrap();
        assert!(effects[0].is_stop());
        assert_eq!(effects[1], Effect::FinishLabel("X".to_string()));
        assert_eq!(sm.state().error().map(|e| e.message.as_str()), Some("X"));
    }

    #[test]
    fn test_settle_resolves_success() {
        let mut sm = machine();
        let now = Instant::now();
        polling(&mut sm, now);
        sm.apply(OrchestratorEvent::PollCompleted(result()), now)
            .unwrap();

        let effects = sm
            .apply(
                OrchestratorEvent::SettleElapsed,
                now + Duration::from_millis(300),
            )
            .unwrap();
        assert_eq!(effects, vec![Effect::Resolve(Ok(result()))]);
        assert_eq!(sm.state().result(), Some(&result()));
        assert_eq!(sm.snapshot(now).map(|s| s.overall), Some(1.0));
    }

    #[test]
    fn test_success_keeps_the_attempt_it_finished_on() {
        let mut sm = machine();
        let now = Instant::now();
        polling(&mut sm, now);
        sm.apply(
            OrchestratorEvent::PollPending {
                retry_count: Some(0),
            },
            now + Duration::from_secs(3),
        )
        .unwrap();

        let effects = sm
            .apply(
                OrchestratorEvent::PollCompleted(result()),
                now + Duration::from_secs(6),
            )
            .unwrap();
        match effects[1] {
            Effect::EmitSnapshot(snapshot) => {
                assert_eq!(snapshot.attempt_number, 1);
                assert_eq!(snapshot.completed_segments, 3);
                assert_eq!(snapshot.overall, 1.0);
            }
            ref other => panic!("Expected snapshot, got {other:?}"),
        }

        let settled = now + Duration::from_millis(6_300);
        sm.apply(OrchestratorEvent::SettleElapsed, settled).unwrap();
        assert_eq!(sm.state().settled_attempt(), Some(1));
        assert_eq!(sm.snapshot(settled).map(|s| s.attempt_number), Some(1));
    }

    #[test]
    fn test_timer_events_are_inert_after_terminal() {
        let mut sm = machine();
        let now = Instant::now();
        polling(&mut sm, now);
        sm.apply(
            OrchestratorEvent::PollFailed(ErrorInfo::network("reset")),
            now,
        )
        .unwrap();

        for event in [
            OrchestratorEvent::ProgressTick,
            OrchestratorEvent::LabelTick,
            OrchestratorEvent::SettleElapsed,
        ] {
            assert!(sm.apply(event, now).unwrap().is_empty());
        }
        assert_eq!(sm.phase(), OrchestratorPhase::Failed);
    }

    #[test]
    fn test_pending_poll_advances_attempt() {
        let mut sm = machine();
        let now = Instant::now();
        polling(&mut sm, now);

        let later = now + Duration::from_secs(5);
        let effects = sm
            .apply(
                OrchestratorEvent::PollPending {
                    retry_count: Some(1),
                },
                later,
            )
            .unwrap();
        assert_eq!(effects[0], Effect::AttemptAdvanced { attempt: 2 });
        match effects[1] {
            Effect::EmitSnapshot(snapshot) => {
                assert_eq!(snapshot.attempt_number, 2);
                assert_eq!(snapshot.current_fraction, 0.0);
                assert!((snapshot.overall - 1.0 / 3.0).abs() < 1e-9);
            }
            ref other => panic!("Expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = machine();
        let now = Instant::now();

        let err = sm
            .apply(OrchestratorEvent::PollCompleted(result()), now)
            .unwrap_err();
        assert_eq!(
            err,
            StateMachineError::InvalidTransition {
                from: OrchestratorPhase::Idle,
                event: "poll_completed",
            }
        );

        polling(&mut sm, now);
        assert!(sm.apply(OrchestratorEvent::Submit, now).is_err());
        assert_eq!(sm.phase(), OrchestratorPhase::Polling);
    }

    #[test]
    fn test_reset_from_any_phase() {
        let mut sm = machine();
        let now = Instant::now();
        polling(&mut sm, now);

        let effects = sm.apply(OrchestratorEvent::Reset, now).unwrap();
        assert_eq!(effects, vec![Effect::StopTimers]);
        assert_eq!(sm.phase(), OrchestratorPhase::Idle);

        assert!(sm.apply(OrchestratorEvent::Reset, now).unwrap().is_empty());
    }

    #[test]
    fn test_restart_after_failure_begins_at_first_attempt() {
        let mut sm = machine();
        let now = Instant::now();
        polling(&mut sm, now);
        sm.apply(
            OrchestratorEvent::PollPending {
                retry_count: Some(2),
            },
            now,
        )
        .unwrap();
        sm.apply(
            OrchestratorEvent::PollFailed(ErrorInfo::job_failed("X")),
            now,
        )
        .unwrap();

        polling(&mut sm, now);
        assert_eq!(sm.snapshot(now).map(|s| s.attempt_number), Some(1));
    }
}
