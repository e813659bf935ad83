//! # Orchestration
//!
//! Runtime side of the crate. [`JobOrchestrator`] drives one run at a time
//! through the [`state_machine`](crate::state_machine) reducer:
//!
//! - **JobOrchestrator**: validates input, submits, polls and owns the timers
//! - **JobRun**: the caller's handle on one run (snapshot stream and outcome)
//! - **ErrorRecoveryController**: retry affordance for failed runs
//! - **ScreenCoordinator**: pairs a Generation and an Ideation orchestrator
//!   and tears down the one being left on a mode switch
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipe_jobs::config::{Preset, RuntimeSettings};
//! use recipe_jobs::events::EventPublisher;
//! use recipe_jobs::orchestration::JobOrchestrator;
//! use recipe_jobs::service::{JobRequest, JobService};
//!
//! # async fn example(service: Arc<dyn JobService>) {
//! let mut orchestrator = JobOrchestrator::new(
//!     service,
//!     Preset::Generation,
//!     &RuntimeSettings::default(),
//!     EventPublisher::default(),
//! );
//!
//! let mut run = orchestrator
//!     .start(JobRequest::generate("a quick weeknight curry"))
//!     .expect("valid prompt");
//! while let Some(snapshot) = run.next_snapshot().await {
//!     println!("{:.0}% ({})", snapshot.overall * 100.0, orchestrator.current_label());
//! }
//! # }
//! ```

mod core;
pub mod coordinator;
pub mod orchestrator;
pub mod recovery;
pub mod run;

pub use coordinator::{ScreenCoordinator, ScreenMode};
pub use orchestrator::JobOrchestrator;
pub use recovery::{ErrorRecoveryController, RecoveryNotice};
pub use run::JobRun;
