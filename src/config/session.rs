use serde::Deserialize;

use crate::helpers::time::{minutes, seconds};
use crate::resilience::retry::RetrySettings;
use crate::session::{CoordinatorSettings, RenewerSettings};
use crate::utils::constants::*;

/// ================================
/// Session refresh settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// background cadence and token lifetime
    pub refresh_interval_minutes: u64,
    /// minimum spacing between completed refreshes
    #[serde(default = "default_refresh_cooldown_seconds")]
    pub refresh_cooldown_seconds: u64,
    /// wait after a failed background refresh
    #[serde(default = "default_failure_retry_delay_minutes")]
    pub failure_retry_delay_minutes: u64,
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,
    pub startup_retry: Option<RetryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    /// will be mutiply by 2 on every attempt until max_delay_ms 
    pub base_delay_ms: Option<u64>,
    /// invariant: >= base_delay_ms
    pub max_delay_ms: Option<u64>,
}

impl SessionConfig {
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            cooldown: seconds(self.refresh_cooldown_seconds),
            fetch_timeout: seconds(self.fetch_timeout_seconds),
        }
    }

    pub fn renewer_settings(&self) -> RenewerSettings {
        let retry = self.startup_retry.as_ref();
        let refresh_interval = minutes(self.refresh_interval_minutes);
        RenewerSettings {
            refresh_interval,
            // start renewing early enough for a slow fetch to land before expiry
            renewal_lead: seconds(self.fetch_timeout_seconds).min(refresh_interval / 2),
            failure_retry_delay: minutes(self.failure_retry_delay_minutes),
            startup_retry: RetrySettings {
                attempts: retry.and_then(|r| r.attempts).unwrap_or(DEFAULT_STARTUP_ATTEMPTS),
                base_delay_ms: retry.and_then(|r| r.base_delay_ms).unwrap_or(DEFAULT_STARTUP_BASE_DELAY_MS),
                max_delay_ms: retry.and_then(|r| r.max_delay_ms).unwrap_or(DEFAULT_STARTUP_MAX_DELAY_MS),
            },
        }
    }
}

fn default_refresh_cooldown_seconds() -> u64 {
    DEFAULT_REFRESH_COOLDOWN_SECS
}

fn default_failure_retry_delay_minutes() -> u64 {
    DEFAULT_FAILURE_RETRY_DELAY_MINUTES
}

fn default_fetch_timeout_seconds() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}
