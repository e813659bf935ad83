use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::types::{JobRequest, PollResponse, SubmitResponse};

/// Failures reported by a [`JobService`] implementation
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Job not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Message supplied by the server, if any, suitable for showing verbatim
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Backend collaborator that executes generation jobs.
///
/// Implementations own the transport. Futures returned by these methods may be
/// dropped before completion when a run is torn down or superseded.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Enqueue a job and return its identifier
    async fn submit(&self, request: &JobRequest) -> Result<SubmitResponse, ServiceError>;

    /// Fetch the current status of a job
    async fn poll(&self, job_id: &str) -> Result<PollResponse, ServiceError>;

    /// Ask the service to stop a pending or processing job
    async fn cancel(&self, job_id: &str) -> Result<(), ServiceError> {
        let _ = job_id;
        Ok(())
    }

    /// Name used in logs
    fn service_name(&self) -> &str {
        "job_service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_only_for_http_errors() {
        let err = ServiceError::Http {
            status: 500,
            message: "Failed to start recipe generation: quota".to_string(),
        };
        assert_eq!(
            err.server_message(),
            Some("Failed to start recipe generation: quota")
        );

        let err = ServiceError::Http {
            status: 502,
            message: " ".to_string(),
        };
        assert_eq!(err.server_message(), None);

        let err = ServiceError::Transport("connection reset".to_string());
        assert_eq!(err.server_message(), None);
        assert!(ServiceError::Timeout(Duration::from_secs(1)).is_timeout());
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::NotFound("job-1".to_string());
        assert_eq!(err.to_string(), "Job not found: job-1");
    }
}
