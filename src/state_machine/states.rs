use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ErrorInfo;
use crate::progress::AttemptState;
use crate::service::JobResult;

/// Server job owned by the orchestrator between submission and a terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Data carried while the job is being polled
#[derive(Debug, Clone, PartialEq)]
pub struct PollingState {
    pub handle: JobHandle,
    pub attempt: AttemptState,
}

/// Full orchestrator state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OrchestratorState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Submission request in flight
    Submitting,
    Polling(PollingState),
    /// Success confirmed, bar pinned at 100% while the settle delay runs
    SucceedingAnimation {
        handle: JobHandle,
        result: JobResult,
        attempt_number: u32,
    },
    Succeeded {
        result: JobResult,
        attempt_number: u32,
    },
    Failed(ErrorInfo),
}

impl OrchestratorState {
    pub fn phase(&self) -> OrchestratorPhase {
        match self {
            Self::Idle => OrchestratorPhase::Idle,
            Self::Submitting => OrchestratorPhase::Submitting,
            Self::Polling(_) => OrchestratorPhase::Polling,
            Self::SucceedingAnimation { .. } => OrchestratorPhase::SucceedingAnimation,
            Self::Succeeded { .. } => OrchestratorPhase::Succeeded,
            Self::Failed(_) => OrchestratorPhase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    pub fn is_active(&self) -> bool {
        self.phase().is_active()
    }

    /// The live job, if one has been submitted and not yet settled
    pub fn job_handle(&self) -> Option<&JobHandle> {
        match self {
            Self::Polling(polling) => Some(&polling.handle),
            Self::SucceedingAnimation { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Failed(info) => Some(info),
            _ => None,
        }
    }

    /// Attempt that was running when success was confirmed
    pub fn settled_attempt(&self) -> Option<u32> {
        match self {
            Self::SucceedingAnimation { attempt_number, .. }
            | Self::Succeeded { attempt_number, .. } => Some(*attempt_number),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&JobResult> {
        match self {
            Self::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Data-free tag of [`OrchestratorState`], used for logging and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    SucceedingAnimation,
    Succeeded,
    Failed,
}

impl OrchestratorPhase {
    /// Terminal phases run no timers
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Phases during which a run is in progress
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Submitting | Self::Polling | Self::SucceedingAnimation
        )
    }

    /// Phases in which the server job can still be abandoned
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }

    /// Phases from which a fresh submission may begin
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for OrchestratorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Submitting => write!(f, "submitting"),
            Self::Polling => write!(f, "polling"),
            Self::SucceedingAnimation => write!(f, "succeeding_animation"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for OrchestratorPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "submitting" => Ok(Self::Submitting),
            "polling" => Ok(Self::Polling),
            "succeeding_animation" => Ok(Self::SucceedingAnimation),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid orchestrator phase: {s}")),
        }
    }
}
