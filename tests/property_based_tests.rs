mod common;

use common::strategies::*;
use proptest::prelude::*;
use recipe_jobs::config::OrchestratorConfig;
use recipe_jobs::progress::{AttemptState, AttemptTracker, ProgressEstimator};
use recipe_jobs::state_machine::{JobStateMachine, OrchestratorEvent};
use recipe_jobs::validation::validate_prompt;
use recipe_jobs::ErrorKind;
use std::time::Duration;
use tokio::time::Instant;

proptest! {
    /// Property: overall progress stays in [0, 1] and the attempt never leaves [1, max]
    #[test]
    fn progress_is_bounded(
        max_attempts in max_attempts_strategy(),
        polls in poll_sequence_strategy(),
    ) {
        let tracker = AttemptTracker::new(max_attempts);
        let estimator = ProgressEstimator::new(max_attempts, Duration::from_millis(20_000));
        let mut now = Instant::now();
        let mut state = AttemptState::first(now);

        for (retry_count, gap_ms) in polls {
            now += Duration::from_millis(gap_ms);
            tracker.observe(&mut state, retry_count, now);
            estimator.refresh(&mut state, now);
            let snapshot = estimator.snapshot(&state);

            prop_assert!((0.0..=1.0).contains(&snapshot.overall));
            prop_assert!(snapshot.attempt_number >= 1);
            prop_assert!(snapshot.attempt_number <= max_attempts);
            prop_assert_eq!(snapshot.completed_segments, snapshot.attempt_number - 1);
        }
    }

    /// Property: within one run the attempt number never decreases
    #[test]
    fn attempts_are_monotonic(polls in poll_sequence_strategy()) {
        let tracker = AttemptTracker::new(3);
        let mut now = Instant::now();
        let mut state = AttemptState::first(now);
        let mut previous = state.attempt_number;

        for (retry_count, gap_ms) in polls {
            now += Duration::from_millis(gap_ms);
            tracker.observe(&mut state, retry_count, now);
            prop_assert!(state.attempt_number >= previous);
            previous = state.attempt_number;
        }
    }

    /// Property: reported progress never moves backwards while polling
    #[test]
    fn polling_progress_never_regresses(polls in poll_sequence_strategy()) {
        let mut machine = JobStateMachine::new(OrchestratorConfig::generation());
        let mut now = Instant::now();
        machine.apply(OrchestratorEvent::Submit, now).unwrap();
        machine
            .apply(OrchestratorEvent::Submitted { job_id: "job-1".to_string() }, now)
            .unwrap();

        let mut previous = machine.snapshot(now).unwrap().overall;
        for (retry_count, gap_ms) in polls {
            now += Duration::from_millis(gap_ms);
            machine.apply(OrchestratorEvent::PollPending { retry_count }, now).unwrap();
            let overall = machine.snapshot(now).unwrap().overall;
            prop_assert!(overall + 1e-12 >= previous, "{} < {}", overall, previous);
            previous = overall;
        }
    }

    /// Property: blank input is always a validation error
    #[test]
    fn blank_prompts_never_validate(prompt in blank_prompt_strategy()) {
        let err = validate_prompt(&prompt).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::Validation);
    }
}
