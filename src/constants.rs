//! # System Constants
//!
//! Fixed timing values, user-facing fallback messages, default label pools and
//! lifecycle event names shared across the orchestration core.

use std::time::Duration;

/// Timing presets for the two generation flows
pub mod timing {
    use super::Duration;

    pub const GENERATION_MAX_ATTEMPTS: u32 = 3;
    pub const GENERATION_SEGMENT: Duration = Duration::from_millis(20_000);

    pub const IDEATION_MAX_ATTEMPTS: u32 = 2;
    pub const IDEATION_SEGMENT: Duration = Duration::from_millis(15_000);

    /// Matches the backend's advertised `polling_interval` of 3 seconds
    pub const POLL_INTERVAL: Duration = Duration::from_millis(3_000);
    pub const SUCCESS_SETTLE: Duration = Duration::from_millis(300);
    pub const LABEL_CYCLE: Duration = Duration::from_millis(3_000);
    pub const PROGRESS_TICK: Duration = Duration::from_millis(100);
    pub const VALIDATION_DISPLAY: Duration = Duration::from_millis(3_000);

    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
}

/// Input limits enforced before a job is submitted
pub mod limits {
    /// Backend rejects prompts longer than this
    pub const MAX_PROMPT_CHARS: usize = 1000;
}

/// Fallback text shown when the server gives us nothing better
pub mod messages {
    pub const EMPTY_PROMPT: &str = "Please describe what you'd like to cook.";
    pub const PROMPT_TOO_LONG: &str = "Your request is too long. Please shorten it and try again.";
    pub const MISSING_RECIPE_ID: &str = "Select a recipe to modify first.";
    pub const INVALID_OVERRIDES: &str = "Preferences must be a set of named options.";

    pub const NETWORK_FAILURE: &str = "We couldn't reach the kitchen. Please check your connection and try again.";
    pub const REQUEST_TIMED_OUT: &str = "The server took too long to respond. Please try again.";
    pub const JOB_FAILED: &str = "Something went wrong while cooking up your request. Please try again.";
    pub const JOB_CANCELLED: &str = "The request was cancelled.";
    pub const RUN_SUPERSEDED: &str = "A newer request replaced this one.";
    pub const RUN_TORN_DOWN: &str = "The request was stopped.";

    pub const RETRY_ACTION: &str = "Try Again";
}

/// Default rotating status labels
pub mod labels {
    pub const GENERATION: &[&str] = &[
        "Gathering ingredients...",
        "Preheating the oven...",
        "Balancing the flavors...",
        "Writing up the steps...",
        "Plating your recipe...",
    ];

    pub const IDEATION: &[&str] = &[
        "Brainstorming dishes...",
        "Exploring cuisines...",
        "Mixing up ideas...",
        "Tasting a few options...",
    ];

    pub const GENERATION_DONE: &str = "Your recipe is ready!";
    pub const IDEATION_DONE: &str = "Your ideas are ready!";
}

/// Lifecycle event names published by the orchestrator
pub mod events {
    pub const JOB_SUBMITTED: &str = "job.submitted";
    pub const JOB_ATTEMPT_ADVANCED: &str = "job.attempt_advanced";
    pub const JOB_SUCCEEDED: &str = "job.succeeded";
    pub const JOB_FAILED: &str = "job.failed";
    pub const JOB_CANCELLED: &str = "job.cancelled";
    pub const JOB_VALIDATION_REJECTED: &str = "job.validation_rejected";
}
