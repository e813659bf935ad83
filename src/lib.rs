#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Recipe Jobs Core
//!
//! Client-side orchestration for long-running recipe and idea generation jobs.
//!
//! ## Overview
//!
//! Generation work runs on a remote job service that retries internally.
//! This crate submits a job, polls it until it settles, and turns the
//! server's opaque `retry_count` plus elapsed time into a smooth progress
//! estimate and a rotating status label. A run ends in exactly one of two
//! ways: a result after a short settle animation, or an error carrying a
//! retry affordance.
//!
//! ## Architecture
//!
//! Every transition goes through a pure reducer, [`state_machine::JobStateMachine`],
//! which returns the effects to carry out. The async driver in
//! [`orchestration`] owns the poll, progress and label timers and applies
//! those effects under a single lock, so a terminal transition stops the
//! timers before anything else can observe the new state.
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Orchestrator driver, run handles, error recovery, screen coordination
//! - [`state_machine`] - Orchestrator states, events, effects and the reducer
//! - [`progress`] - Attempt tracking and time-based progress estimation
//! - [`labels`] - Rotating status label
//! - [`service`] - Job service collaborator trait and wire types
//! - [`config`] - Timing presets and runtime settings
//! - [`events`] - Lifecycle event publishing
//! - [`validation`] - Input validation before submission
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipe_jobs::config::{Preset, SettingsLoader};
//! use recipe_jobs::events::EventPublisher;
//! use recipe_jobs::orchestration::JobOrchestrator;
//! use recipe_jobs::service::{JobRequest, JobService};
//!
//! # async fn example(service: Arc<dyn JobService>) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SettingsLoader::new().load()?;
//! recipe_jobs::logging::init_structured_logging(&settings);
//!
//! let mut orchestrator =
//!     JobOrchestrator::new(service, Preset::Ideation, &settings, EventPublisher::default());
//! let run = orchestrator.start(JobRequest::ideate("something with leftover rice"))?;
//! let ideas = run.wait().await?;
//! println!("{}", ideas.payload);
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! Timer behaviour is tested on tokio's paused clock against
//! [`test_helpers::ScriptedJobService`]:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod labels;
pub mod logging;
pub mod orchestration;
pub mod progress;
pub mod service;
pub mod state_machine;
pub mod test_helpers;
pub mod validation;

pub use config::{OrchestratorConfig, Preset, RuntimeSettings, SettingsLoader};
pub use error::{ErrorInfo, ErrorKind};
pub use events::{EventPublisher, LifecycleEvent};
pub use orchestration::{
    ErrorRecoveryController, JobOrchestrator, JobRun, RecoveryNotice, ScreenCoordinator,
    ScreenMode,
};
pub use progress::ProgressSnapshot;
pub use service::{JobKind, JobRequest, JobResult, JobService, ServiceError};
pub use state_machine::{OrchestratorPhase, OrchestratorState};
