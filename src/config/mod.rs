//! # Configuration
//!
//! Two layers of configuration live here:
//!
//! - [`OrchestratorConfig`]: the timing envelope of one orchestrator. Only the
//!   fixed [`Preset`]s produce one; callers pick Generation or Ideation and
//!   nothing at runtime changes the numbers.
//! - [`RuntimeSettings`]: ambient settings (environment, logging, request
//!   timeout, label pools) loaded by [`SettingsLoader`] from defaults, an
//!   optional TOML file and `RECIPE_JOBS__*` environment variables.
//!
//! ```rust
//! use recipe_jobs::config::{OrchestratorConfig, Preset};
//!
//! let config = OrchestratorConfig::for_preset(Preset::Generation);
//! assert_eq!(config.max_attempts, 3);
//! assert!(config.validate().is_ok());
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::constants::{labels, timing};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::SettingsLoader;

/// Named orchestrator configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Recipe generation and modification
    Generation,
    /// Idea generation
    Ideation,
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Ideation => write!(f, "ideation"),
        }
    }
}

/// Timing envelope for one orchestrator instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub preset: Preset,
    /// Number of server-side attempts the progress bar is split into
    pub max_attempts: u32,
    /// Expected duration of a single attempt
    pub segment_duration: Duration,
    pub poll_interval: Duration,
    /// Pause between a confirmed success and resolving the run
    pub success_settle: Duration,
    pub label_cycle: Duration,
    /// Cadence of the time-based progress refresh
    pub progress_tick: Duration,
    /// How long a validation message stays up before clearing itself
    pub validation_display: Duration,
}

impl OrchestratorConfig {
    pub fn generation() -> Self {
        Self {
            preset: Preset::Generation,
            max_attempts: timing::GENERATION_MAX_ATTEMPTS,
            segment_duration: timing::GENERATION_SEGMENT,
            poll_interval: timing::POLL_INTERVAL,
            success_settle: timing::SUCCESS_SETTLE,
            label_cycle: timing::LABEL_CYCLE,
            progress_tick: timing::PROGRESS_TICK,
            validation_display: timing::VALIDATION_DISPLAY,
        }
    }

    pub fn ideation() -> Self {
        Self {
            preset: Preset::Ideation,
            max_attempts: timing::IDEATION_MAX_ATTEMPTS,
            segment_duration: timing::IDEATION_SEGMENT,
            ..Self::generation()
        }
    }

    pub fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Generation => Self::generation(),
            Preset::Ideation => Self::ideation(),
        }
    }

    /// Check the structural invariants every orchestrator relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts < 1 {
            return Err(ConfigurationError::invalid_value(
                "max_attempts",
                "must be at least 1",
            ));
        }

        let positive = [
            ("segment_duration", self.segment_duration),
            ("poll_interval", self.poll_interval),
            ("label_cycle", self.label_cycle),
            ("progress_tick", self.progress_tick),
            ("validation_display", self.validation_display),
        ];
        for (field, value) in positive {
            if value.is_zero() {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}

/// Rotating label pools, one per preset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LabelPools {
    pub generation: Vec<String>,
    pub ideation: Vec<String>,
}

impl Default for LabelPools {
    fn default() -> Self {
        Self {
            generation: labels::GENERATION.iter().map(|s| s.to_string()).collect(),
            ideation: labels::IDEATION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LabelPools {
    pub fn for_preset(&self, preset: Preset) -> &[String] {
        match preset {
            Preset::Generation => &self.generation,
            Preset::Ideation => &self.ideation,
        }
    }
}

/// Ambient runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Deployment environment (development, test, production)
    pub environment: String,
    /// Explicit log filter; derived from the environment when absent
    pub log_level: Option<String>,
    pub json_logs: bool,
    /// Upper bound on a single submit or poll request
    pub request_timeout_ms: u64,
    pub labels: LabelPools,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: None,
            json_logs: false,
            request_timeout_ms: timing::DEFAULT_REQUEST_TIMEOUT_MS,
            labels: LabelPools::default(),
        }
    }
}

impl RuntimeSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.labels.generation.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "labels.generation",
                "must contain at least one label",
            ));
        }
        if self.labels.ideation.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "labels.ideation",
                "must contain at least one label",
            ));
        }
        Ok(())
    }
}
