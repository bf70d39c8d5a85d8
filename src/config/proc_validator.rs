//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * server / metrics / logging settings
//!   * refresh interval, cooldown and retry invariants
//!   * token source request details

use std::collections::HashMap;
use tracing::{error, info};

use crate::config::session::{RetryConfig, SessionConfig};
use crate::config::settings::SettingsConfig;
use crate::config::sources::{GenericSourceValue, HttpSourceConfig, ServiceConfig, SourceConfig};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{DEFAULT_STARTUP_BASE_DELAY_MS, DEFAULT_STARTUP_MAX_DELAY_MS};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_session(&cfg.session, &mut errors);
    validate_source(&cfg.source, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

/// SESSION VALIDATION
fn validate_session(session: &SessionConfig, errors: &mut Vec<String>) {
    if session.refresh_interval_minutes == 0 {
        errors.push("session.refresh_interval_minutes must be > 0".to_string());
    }
    if session.refresh_cooldown_seconds == 0 {
        errors.push("session.refresh_cooldown_seconds must be > 0".to_string());
    }
    if session.failure_retry_delay_minutes == 0 {
        errors.push("session.failure_retry_delay_minutes must be > 0".to_string());
    }
    if session.fetch_timeout_seconds == 0 {
        errors.push("session.fetch_timeout_seconds must be > 0".to_string());
    }

    // a cooldown as long as the interval would swallow every background refresh
    if session.refresh_interval_minutes > 0
        && session.refresh_cooldown_seconds >= session.refresh_interval_minutes.saturating_mul(60)
    {
        errors.push(format!(
            "session.refresh_cooldown_seconds ({}) must be shorter than refresh_interval_minutes ({}m)",
            session.refresh_cooldown_seconds, session.refresh_interval_minutes
        ));
    }

    if let Some(retry) = &session.startup_retry {
        validate_retry("session.startup_retry", retry, errors);
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if let Some(attempts) = retry.attempts {
        if attempts == 0 {
            errors.push(format!("{}.attempts must be > 0", path));
        }
    }
    // compare effective values, defaults included
    let base = retry.base_delay_ms.unwrap_or(DEFAULT_STARTUP_BASE_DELAY_MS);
    let max = retry.max_delay_ms.unwrap_or(DEFAULT_STARTUP_MAX_DELAY_MS);
    if max < base {
        errors.push(format!(
            "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
            path, max, base
        ));
    }
}

/// SOURCE VALIDATION
fn validate_source(source: &SourceConfig, errors: &mut Vec<String>) {
    match source {
        SourceConfig::Simulated(_) => {}
        SourceConfig::Http(http) => validate_http_source(http, errors),
    }
}

fn validate_http_source(http: &HttpSourceConfig, errors: &mut Vec<String>) {
    if http.url.trim().is_empty() {
        errors.push("source.url cannot be empty".to_string());
    } else if !(http.url.starts_with("http://") || http.url.starts_with("https://")) {
        errors.push(format!("source.url '{}' must start with http:// or https://", http.url));
    }

    if let Some(field) = &http.token_field {
        if field.trim().is_empty() {
            errors.push("source.token_field must not be empty when provided".to_string());
        }
    }

    http.headers
        .iter()
        .flat_map(|headers: &HashMap<String, GenericSourceValue>| headers.iter())
        .for_each(|(name, value)| {
            validate_generic_source_value(&format!("source.headers.{}", name), value, errors)
        });
}

fn validate_generic_source_value(path: &str, v: &GenericSourceValue, errors: &mut Vec<String>) {
    match v {
        GenericSourceValue::Literal { value } => {
            if value.trim().is_empty() {
                errors.push(format!("{}: literal value cannot be empty", path));
            }
        }
        GenericSourceValue::FromEnv { from_env } => {
            if from_env.trim().is_empty() {
                errors.push(format!("{}: env name cannot be empty", path));
            }
        }
        GenericSourceValue::FromFile { path: file } => {
            if file.trim().is_empty() {
                errors.push(format!("{}: from_file path cannot be empty", path));
            }
        }
    }
}
