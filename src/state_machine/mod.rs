// State machine module for job orchestration
//
// The orchestrator is modelled as a reducer: network responses and timer
// ticks arrive as events, each event is one atomic transition, and the
// transition returns the effects the async driver carries out.

pub mod effects;
pub mod errors;
pub mod events;
pub mod job_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use effects::Effect;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::OrchestratorEvent;
pub use job_state_machine::JobStateMachine;
pub use states::{JobHandle, OrchestratorPhase, OrchestratorState, PollingState};
