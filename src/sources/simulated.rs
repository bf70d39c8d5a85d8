use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::config::sources::SimulatedSourceConfig;
use crate::session::token::TokenId;
use crate::sources::FetchToken;

/// Stand-in for a remote session issuer: waits, then hands out a random id
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    latency: Duration,
}

impl SimulatedSource {
    pub fn new(cfg: &SimulatedSourceConfig) -> Self {
        Self {
            latency: Duration::from_millis(cfg.latency_ms),
        }
    }
}

impl FetchToken for SimulatedSource {
    async fn fetch_token(&self) -> Result<TokenId> {
        debug!("simulated fetch, latency {:?}", self.latency);
        tokio::time::sleep(self.latency).await;
        Ok(TokenId::random())
    }
}
