//! Runtime Settings Loader
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults (with the environment auto-detected)
//! 2. An optional TOML file
//! 3. Environment variables under `RECIPE_JOBS__`, e.g.
//!    `RECIPE_JOBS__REQUEST_TIMEOUT_MS=5000` or `RECIPE_JOBS__JSON_LOGS=true`

use super::error::{ConfigResult, ConfigurationError};
use super::RuntimeSettings;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_ENV_PREFIX: &str = "RECIPE_JOBS";

/// Builder-style loader for [`RuntimeSettings`]
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self {
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a TOML file; the file must exist
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load and validate settings
    pub fn load(&self) -> ConfigResult<RuntimeSettings> {
        let defaults = RuntimeSettings {
            environment: Self::detect_environment(),
            ..RuntimeSettings::default()
        };

        let mut builder = Config::builder().add_source(Config::try_from(&defaults)?);

        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigurationError::file_not_found(
                    path.display().to_string(),
                ));
            }
            debug!(path = %path.display(), "Loading settings file");
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: RuntimeSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        debug!(
            environment = %settings.environment,
            request_timeout_ms = settings.request_timeout_ms,
            json_logs = settings.json_logs,
            "Runtime settings loaded"
        );

        Ok(settings)
    }

    /// Environment name from `RECIPE_JOBS_ENV`, then `APP_ENV`, else development
    pub fn detect_environment() -> String {
        env::var("RECIPE_JOBS_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
