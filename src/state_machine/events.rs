use crate::error::ErrorInfo;
use crate::service::JobResult;

/// Inputs to the orchestrator state machine.
///
/// Network responses and timer ticks are both delivered as events; the
/// machine is the only place state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    /// Begin a new submission
    Submit,
    /// The job service accepted the job
    Submitted { job_id: String },
    /// The submission request failed
    SubmitFailed(ErrorInfo),
    /// Poll returned a non-terminal status
    PollPending { retry_count: Option<u32> },
    /// Poll returned `completed`
    PollCompleted(JobResult),
    /// Poll failed, either in transport or because the job failed
    PollFailed(ErrorInfo),
    /// Periodic progress refresh
    ProgressTick,
    /// Periodic label rotation
    LabelTick,
    /// Success settle delay elapsed
    SettleElapsed,
    /// Abandon whatever is in flight and return to idle
    Reset,
}

impl OrchestratorEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Submitted { .. } => "submitted",
            Self::SubmitFailed(_) => "submit_failed",
            Self::PollPending { .. } => "poll_pending",
            Self::PollCompleted(_) => "poll_completed",
            Self::PollFailed(_) => "poll_failed",
            Self::ProgressTick => "progress_tick",
            Self::LabelTick => "label_tick",
            Self::SettleElapsed => "settle_elapsed",
            Self::Reset => "reset",
        }
    }

    /// Events produced by timers rather than by the caller or the network
    pub fn is_timer(&self) -> bool {
        matches!(
            self,
            Self::ProgressTick | Self::LabelTick | Self::SettleElapsed
        )
    }

    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            Self::SubmitFailed(info) | Self::PollFailed(info) => Some(info),
            _ => None,
        }
    }
}
