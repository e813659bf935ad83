use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::attempt_tracker::AttemptState;

/// Point-in-time view of a run's progress, as rendered by a segmented bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub attempt_number: u32,
    pub max_attempts: u32,
    pub completed_segments: u32,
    pub current_fraction: f64,
    /// `(completed_segments + current_fraction) / max_attempts`, clamped to `[0, 1]`
    pub overall: f64,
}

impl ProgressSnapshot {
    pub fn is_complete(&self) -> bool {
        self.overall >= 1.0
    }
}

/// Time-based progress estimate.
///
/// The estimate only knows how long the current attempt has been running, not
/// what the server is doing. Each segment saturates at its own share of the
/// bar; [`ProgressEstimator::completed`] reports a confirmed full bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEstimator {
    max_attempts: u32,
    segment_duration: Duration,
}

impl ProgressEstimator {
    pub fn new(max_attempts: u32, segment_duration: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            segment_duration,
        }
    }

    /// `min(elapsed / segment_duration, 1)`
    pub fn segment_fraction(&self, segment_started_at: Instant, now: Instant) -> f64 {
        if self.segment_duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(segment_started_at);
        (elapsed.as_secs_f64() / self.segment_duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Recompute `segment_progress` from the clock
    pub fn refresh(&self, state: &mut AttemptState, now: Instant) {
        state.segment_progress = self.segment_fraction(state.segment_started_at, now);
    }

    pub fn snapshot(&self, state: &AttemptState) -> ProgressSnapshot {
        let attempt_number = state.attempt_number.clamp(1, self.max_attempts);
        let completed_segments = attempt_number - 1;
        let current_fraction = state.segment_progress.clamp(0.0, 1.0);
        let overall = ((f64::from(completed_segments) + current_fraction)
            / f64::from(self.max_attempts))
        .clamp(0.0, 1.0);

        ProgressSnapshot {
            attempt_number,
            max_attempts: self.max_attempts,
            completed_segments,
            current_fraction,
            overall,
        }
    }

    /// Snapshot reported on confirmed success; the bar fills but the
    /// attempt stays where the server finished
    pub fn completed(&self, attempt_number: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            attempt_number: attempt_number.clamp(1, self.max_attempts),
            max_attempts: self.max_attempts,
            completed_segments: self.max_attempts,
            current_fraction: 1.0,
            overall: 1.0,
        }
    }
}
