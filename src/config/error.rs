use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

impl ConfigurationError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
