//! # Structured Logging Module
//!
//! Environment-aware structured logging for the orchestration core. Console
//! output by default, JSON lines when `json_logs` is set.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::RuntimeSettings;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging(settings: &RuntimeSettings) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = settings
            .log_level
            .clone()
            .unwrap_or_else(|| get_log_level(&settings.environment).to_string());

        let layer = if settings.json_logs {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(filter.clone()))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(filter.clone()))
                .boxed()
        };

        // A host application may already own the global subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %settings.environment,
            filter = %filter,
            json = settings.json_logs,
            "Structured logging initialized"
        );
    });
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for job operations
pub fn log_job_operation(
    operation: &str,
    kind: &str,
    job_id: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        kind = %kind,
        job_id = job_id,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "JOB_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
