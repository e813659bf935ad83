use tokio::time::Instant;

/// Progress bookkeeping for the attempt currently running on the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptState {
    /// 1-based, never above the configured maximum
    pub attempt_number: u32,
    pub segment_started_at: Instant,
    /// Time-based fraction of the current segment, in `[0, 1]`
    pub segment_progress: f64,
}

impl AttemptState {
    /// State for the first attempt of a freshly submitted job
    pub fn first(now: Instant) -> Self {
        Self {
            attempt_number: 1,
            segment_started_at: now,
            segment_progress: 0.0,
        }
    }
}

/// Maps server-reported retry counts onto a bounded attempt index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptTracker {
    max_attempts: u32,
}

impl AttemptTracker {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `min(retry_count + 1, max_attempts)`
    pub fn attempt_for(&self, retry_count: u32) -> u32 {
        retry_count.saturating_add(1).min(self.max_attempts)
    }

    /// Fold a poll response's `retry_count` into `state`.
    ///
    /// Returns `true` when the attempt advanced. Advancing starts a new segment
    /// from zero; a repeated or lower retry count leaves the state untouched.
    pub fn observe(&self, state: &mut AttemptState, retry_count: Option<u32>, now: Instant) -> bool {
        let Some(retry_count) = retry_count else {
            return false;
        };

        let next = self.attempt_for(retry_count);
        if next <= state.attempt_number {
            return false;
        }

        state.attempt_number = next;
        state.segment_started_at = now;
        state.segment_progress = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_attempt_mapping_is_capped() {
        let tracker = AttemptTracker::new(3);
        assert_eq!(tracker.attempt_for(0), 1);
        assert_eq!(tracker.attempt_for(2), 3);
        assert_eq!(tracker.attempt_for(7), 3);
        assert_eq!(tracker.attempt_for(u32::MAX), 3);
    }

    #[test]
    fn test_retry_sequence_advances_attempts() {
        let tracker = AttemptTracker::new(3);
        let start = Instant::now();
        let mut state = AttemptState::first(start);

        let mut seen = Vec::new();
        for (i, retry_count) in [0u32, 1, 2].into_iter().enumerate() {
            let now = start + Duration::from_secs(i as u64 * 5);
            tracker.observe(&mut state, Some(retry_count), now);
            seen.push(state.attempt_number);
        }

        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_advancing_resets_segment() {
        let tracker = AttemptTracker::new(3);
        let start = Instant::now();
        let mut state = AttemptState::first(start);
        state.segment_progress = 0.8;

        let later = start + Duration::from_secs(16);
        assert!(tracker.observe(&mut state, Some(1), later));
        assert_eq!(state.attempt_number, 2);
        assert_eq!(state.segment_started_at, later);
        assert_eq!(state.segment_progress, 0.0);
    }

    #[test]
    fn test_repeated_or_lower_retry_count_is_ignored() {
        let tracker = AttemptTracker::new(3);
        let start = Instant::now();
        let mut state = AttemptState::first(start);
        tracker.observe(&mut state, Some(2), start);
        state.segment_progress = 0.4;

        let later = start + Duration::from_secs(3);
        assert!(!tracker.observe(&mut state, Some(2), later));
        assert!(!tracker.observe(&mut state, Some(0), later));
        assert!(!tracker.observe(&mut state, None, later));
        assert_eq!(state.attempt_number, 3);
        assert_eq!(state.segment_started_at, start);
        assert_eq!(state.segment_progress, 0.4);
    }
}
