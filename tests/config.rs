//! Configuration Module Tests
//!
//! Preset timing and the layered runtime settings loader.

use recipe_jobs::config::{
    ConfigurationError, OrchestratorConfig, Preset, RuntimeSettings, SettingsLoader,
};
use std::io::Write;
use std::time::Duration;

#[test]
fn presets_have_documented_timing() {
    let generation = OrchestratorConfig::for_preset(Preset::Generation);
    assert_eq!(generation.max_attempts, 3);
    assert_eq!(generation.segment_duration, Duration::from_secs(20));
    assert_eq!(generation.poll_interval, Duration::from_secs(3));
    assert_eq!(generation.validation_display, Duration::from_secs(3));

    let ideation = OrchestratorConfig::for_preset(Preset::Ideation);
    assert_eq!(ideation.max_attempts, 2);
    assert_eq!(ideation.segment_duration, Duration::from_secs(15));
    assert_eq!(ideation.success_settle, Duration::from_millis(300));

    assert!(generation.validate().is_ok());
    assert!(ideation.validate().is_ok());
}

#[test]
fn environment_overrides_file_values() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "environment = \"test\"").unwrap();
    writeln!(file, "request_timeout_ms = 4000").unwrap();

    std::env::set_var("RECIPE_JOBS_IT_ENV__REQUEST_TIMEOUT_MS", "2500");
    let settings = SettingsLoader::new()
        .with_file(file.path())
        .with_env_prefix("RECIPE_JOBS_IT_ENV")
        .load()
        .expect("settings should load");
    std::env::remove_var("RECIPE_JOBS_IT_ENV__REQUEST_TIMEOUT_MS");

    assert_eq!(settings.environment, "test");
    assert_eq!(settings.request_timeout(), Duration::from_millis(2500));
}

#[test]
fn defaults_load_without_any_sources() {
    let settings = SettingsLoader::new()
        .with_env_prefix("RECIPE_JOBS_IT_DEFAULTS")
        .load()
        .expect("defaults should load");

    let defaults = RuntimeSettings::default();
    assert_eq!(settings.request_timeout_ms, defaults.request_timeout_ms);
    assert_eq!(settings.labels, defaults.labels);
    assert!(!settings.json_logs);
}

#[test]
fn invalid_settings_are_rejected_after_load() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "request_timeout_ms = 0").unwrap();

    let err = SettingsLoader::new()
        .with_file(file.path())
        .with_env_prefix("RECIPE_JOBS_IT_INVALID")
        .load()
        .unwrap_err();

    match err {
        ConfigurationError::InvalidValue { field, .. } => assert_eq!(field, "request_timeout_ms"),
        other => panic!("Expected InvalidValue, got {other:?}"),
    }
}
