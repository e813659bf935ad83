use thiserror::Error;

use super::states::OrchestratorPhase;

/// Errors raised by the orchestrator state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition {
        from: OrchestratorPhase,
        event: &'static str,
    },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
