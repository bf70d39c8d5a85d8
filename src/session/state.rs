use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::helpers::time::expiration_after;
use crate::session::token::TokenId;

/// Consistent view of the committed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub token_id: TokenId,
    pub expires_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
    /// monotonic twin of `refreshed_at`, used for cooldown gating only
    #[serde(skip)]
    pub refreshed_instant: Instant,
}

impl SessionSnapshot {
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Time elapsed since the refresh that produced this snapshot completed
    pub fn age(&self) -> Duration {
        self.refreshed_instant.elapsed()
    }
}

/// Published session state.
///
/// Readers borrow the latest snapshot without waiting on an in-flight refresh;
/// the refresh coordinator is the only writer.
#[derive(Debug, Clone)]
pub struct SessionState {
    refresh_interval: Duration,
    published: Arc<watch::Sender<Option<SessionSnapshot>>>,
}

impl SessionState {
    pub fn new(refresh_interval: Duration) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            refresh_interval,
            published: Arc::new(published),
        }
    }

    pub fn read(&self) -> Option<SessionSnapshot> {
        *self.published.borrow()
    }

    /// Replace the committed session in one step
    pub(crate) fn commit(&self, token_id: TokenId, now: DateTime<Utc>) -> SessionSnapshot {
        let snapshot = SessionSnapshot {
            token_id,
            expires_at: expiration_after(now, self.refresh_interval),
            refreshed_at: now,
            refreshed_instant: Instant::now(),
        };
        self.published.send_replace(Some(snapshot));
        snapshot
    }

    /// Receiver notified on every commit
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionSnapshot>> {
        self.published.subscribe()
    }
}
