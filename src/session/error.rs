use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by the refresh coordinator and the background renewer.
///
/// Cloneable so a single failed fetch can be handed to every caller that joined it.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The token source returned an error or did not answer in time
    #[error("token fetch failed: {0:#}")]
    FetchFailure(Arc<anyhow::Error>),

    /// The fetch task ended without publishing a result
    #[error("refresh was abandoned before it produced a result")]
    RefreshAbandoned,

    /// Shutdown was requested while the renewer was suspended
    #[error("cancelled while waiting")]
    CancelledDuringWait,
}

impl SessionError {
    pub fn fetch_failure(err: anyhow::Error) -> Self {
        SessionError::FetchFailure(Arc::new(err))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::CancelledDuringWait)
    }
}
