//! Sources module
//!
//! Defines the token source contract and builds the configured source.

use anyhow::Result;
use std::future::Future;

use crate::config::sources::SourceConfig;
use crate::session::token::TokenId;

pub mod http;
pub mod simulated;

use http::HttpSource;
use simulated::SimulatedSource;

/// Anything that can produce a new session token id.
///
/// Calls may be slow; the refresh coordinator never runs two of them at once.
pub trait FetchToken {
    fn fetch_token(&self) -> impl Future<Output = Result<TokenId>> + Send;
}

#[derive(Debug, Clone)]
pub enum SourceKind {
    Simulated(SimulatedSource),
    Http(HttpSource),
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Simulated(_) => "simulated",
            SourceKind::Http(_) => "http",
        }
    }
}

impl FetchToken for SourceKind {
    async fn fetch_token(&self) -> Result<TokenId> {
        match self {
            SourceKind::Simulated(s) => s.fetch_token().await,
            SourceKind::Http(s) => s.fetch_token().await,
        }
    }
}

pub fn build_source(cfg: &SourceConfig) -> Result<SourceKind> {
    let source = match cfg {
        SourceConfig::Simulated(simulated) => SourceKind::Simulated(SimulatedSource::new(simulated)),
        SourceConfig::Http(http) => SourceKind::Http(HttpSource::new(http.clone())?),
    };
    Ok(source)
}
