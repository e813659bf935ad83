use std::time::Duration;

use crate::error::ErrorInfo;
use crate::progress::ProgressSnapshot;
use crate::service::JobResult;

/// Side effects requested by a transition, in the order they must be applied
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start the poll, progress and label timers
    StartTimers,
    /// Stop every timer; always first on a terminal transition
    StopTimers,
    EmitSnapshot(ProgressSnapshot),
    AttemptAdvanced { attempt: u32 },
    RotateLabel,
    /// Pin the label to a terminal message
    FinishLabel(String),
    ScheduleSettle(Duration),
    Resolve(Result<JobResult, ErrorInfo>),
}

impl Effect {
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::StopTimers)
    }
}
