use http::Method;
use serde::Deserialize;
use std::collections::HashMap;
use crate::config::{session::SessionConfig, settings::SettingsConfig};
use crate::utils::constants::DEFAULT_SIMULATED_LATENCY_MS;


/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub session: SessionConfig,
    pub source: SourceConfig,
}

/// ================================
/// Token source
/// ================================
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Simulated(SimulatedSourceConfig),
    Http(HttpSourceConfig),
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatedSourceConfig {
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

/// HTTP request details
#[derive(Debug, Deserialize, Clone)]
pub struct HttpSourceConfig {
    pub url: String,
    #[serde(with = "http_serde::method", default = "default_method")]
    pub method: Method, // GET, POST
    pub headers: Option<HashMap<String, GenericSourceValue>>,
    /// JSON pointer ("/data/id") or top-level key; absent means the body is the id
    pub token_field: Option<String>,
}

/// Header value sources
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum GenericSourceValue {
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

fn default_latency_ms() -> u64 {
    DEFAULT_SIMULATED_LATENCY_MS
}

fn default_method() -> Method {
    Method::GET
}
