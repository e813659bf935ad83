use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::Preset;

/// The kinds of generation work the job service accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    RecipeGeneration,
    RecipeModification,
    Ideation,
}

impl JobKind {
    /// Timing preset used to present this kind of job
    pub fn preset(&self) -> Preset {
        match self {
            Self::RecipeGeneration | Self::RecipeModification => Preset::Generation,
            Self::Ideation => Preset::Ideation,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecipeGeneration => write!(f, "recipe_generation"),
            Self::RecipeModification => write!(f, "recipe_modification"),
            Self::Ideation => write!(f, "ideation"),
        }
    }
}

/// Caller-supplied payload for one job submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub kind: JobKind,
    pub prompt: String,
    /// Recipe being modified; required for [`JobKind::RecipeModification`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    /// User preference overrides forwarded to the backend untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Value>,
}

impl JobRequest {
    pub fn generate(prompt: impl Into<String>) -> Self {
        Self {
            kind: JobKind::RecipeGeneration,
            prompt: prompt.into(),
            recipe_id: None,
            overrides: None,
        }
    }

    pub fn modify(recipe_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            kind: JobKind::RecipeModification,
            prompt: prompt.into(),
            recipe_id: Some(recipe_id.into()),
            overrides: None,
        }
    }

    pub fn ideate(prompt: impl Into<String>) -> Self {
        Self {
            kind: JobKind::Ideation,
            prompt: prompt.into(),
            recipe_id: None,
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: Value) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

/// Response to a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Server's suggested polling cadence in seconds
    #[serde(default)]
    pub polling_interval: Option<u64>,
}

impl SubmitResponse {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: None,
            message: None,
            polling_interval: None,
        }
    }
}

/// Server-side job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// One poll response from the job service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub retry_count: Option<u32>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, alias = "error_message")]
    pub error: Option<String>,
    /// Server's own coarse progress (0-100); informational only
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub recipe_id: Option<String>,
}

impl PollResponse {
    pub fn pending(retry_count: Option<u32>) -> Self {
        Self {
            status: JobStatus::Pending,
            retry_count,
            result: None,
            error: None,
            progress: None,
            recipe_id: None,
        }
    }

    pub fn completed(result: Value) -> Self {
        Self {
            status: JobStatus::Completed,
            result: Some(result),
            ..Self::pending(None)
        }
    }

    pub fn failed(error: Option<&str>) -> Self {
        Self {
            status: JobStatus::Failed,
            error: error.map(str::to_string),
            ..Self::pending(None)
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: JobStatus::Cancelled,
            ..Self::pending(None)
        }
    }
}

/// Successful outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub kind: JobKind,
    #[serde(default)]
    pub recipe_id: Option<String>,
    /// Generated content as returned by the service; `null` when omitted
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_status_payload_parses() {
        let body = json!({
            "id": "0b0e6c3e",
            "status": "processing",
            "job_type": "generate",
            "prompt": "weeknight pasta",
            "progress": 30,
            "recipe_id": null,
            "error_message": null,
            "created_at": "2024-05-01T10:00:00Z"
        });

        let response: PollResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.status, JobStatus::Processing);
        assert_eq!(response.progress, Some(30));
        assert_eq!(response.retry_count, None);
        assert!(!response.status.is_terminal());
    }

    #[test]
    fn test_error_message_alias() {
        let response: PollResponse = serde_json::from_value(json!({
            "status": "failed",
            "retry_count": 2,
            "error_message": "model overloaded"
        }))
        .unwrap();

        assert_eq!(response.error.as_deref(), Some("model overloaded"));
        assert_eq!(response.retry_count, Some(2));
        assert!(response.status.is_terminal());
    }

    #[test]
    fn test_submit_response_ignores_unknown_fields() {
        let response: SubmitResponse = serde_json::from_value(json!({
            "job_id": "abc",
            "status": "pending",
            "estimated_completion": "2-3 minutes",
            "status_url": "/api/jobs/recipes/abc/status",
            "polling_interval": 3
        }))
        .unwrap();

        assert_eq!(response.job_id, "abc");
        assert_eq!(response.polling_interval, Some(3));
    }

    #[test]
    fn test_kind_presets() {
        assert_eq!(JobKind::RecipeGeneration.preset(), Preset::Generation);
        assert_eq!(JobKind::RecipeModification.preset(), Preset::Generation);
        assert_eq!(JobKind::Ideation.preset(), Preset::Ideation);
        assert_eq!(JobKind::Ideation.to_string(), "ideation");
    }
}
