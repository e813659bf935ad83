use serde::{Deserialize, Serialize};
use std::fmt;

/// User-facing error categories surfaced by an orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Empty or malformed input, detected before any network call
    Validation,
    /// Transport failure while submitting or polling
    Network,
    /// The job service reported the job as failed
    JobFailed,
    /// The run was superseded, torn down, or cancelled
    Cancelled,
}

impl ErrorKind {
    /// Whether the failure is presented with a retry affordance
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::JobFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Network => write!(f, "network"),
            Self::JobFailed => write!(f, "job_failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Error payload handed to the caller when a run fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn job_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::JobFailed, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Build an error from an optional server message, falling back to `fallback`
    /// when the server supplied nothing usable
    pub fn with_fallback(kind: ErrorKind, message: Option<&str>, fallback: &str) -> Self {
        match message {
            Some(msg) if !msg.trim().is_empty() => Self::new(kind, msg),
            _ => Self::new(kind, fallback),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ErrorInfo {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_keeps_server_message_verbatim() {
        let info = ErrorInfo::with_fallback(ErrorKind::JobFailed, Some("  X  "), "generic");
        assert_eq!(info.message, "  X  ");

        let info = ErrorInfo::with_fallback(ErrorKind::JobFailed, Some("   "), "generic");
        assert_eq!(info.message, "generic");

        let info = ErrorInfo::with_fallback(ErrorKind::Network, None, "generic");
        assert_eq!(info.kind, ErrorKind::Network);
        assert_eq!(info.message, "generic");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::JobFailed.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let info = ErrorInfo::validation("Please enter a prompt");
        assert_eq!(info.to_string(), "validation: Please enter a prompt");
    }
}
