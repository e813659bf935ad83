//! Job service collaborator
//!
//! The orchestrator depends on two logical operations, `submit` and `poll`,
//! plus an optional `cancel`. Transport is left to implementations of
//! [`JobService`].

pub mod job_service;
pub mod types;

pub use job_service::{JobService, ServiceError};
pub use types::{JobKind, JobRequest, JobResult, JobStatus, PollResponse, SubmitResponse};
