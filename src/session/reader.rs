use chrono::{DateTime, Utc};

use crate::session::state::{SessionSnapshot, SessionState};
use crate::session::token::TokenId;

/// Read-only access to the published session.
///
/// Every method is a non-blocking read of the last committed snapshot. Values are
/// `None` only before the renewer has completed its initial refresh.
#[derive(Debug, Clone)]
pub struct SessionReader {
    state: SessionState,
}

impl SessionReader {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.read()
    }

    pub fn token_id(&self) -> Option<TokenId> {
        self.snapshot().map(|s| s.token_id)
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|s| s.expires_at)
    }

    /// A token exists and has not yet expired at `now`
    pub fn is_healthy(&self, now: DateTime<Utc>) -> bool {
        self.snapshot().is_some_and(|s| s.is_fresh_at(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn health_follows_expiration() {
        let state = SessionState::new(Duration::from_secs(60));
        let reader = SessionReader::new(state.clone());
        let now = Utc::now();

        assert!(!reader.is_healthy(now));
        assert!(reader.token_id().is_none());

        let token_id = TokenId::random();
        state.commit(token_id, now);

        assert_eq!(reader.token_id(), Some(token_id));
        assert_eq!(reader.expiration(), Some(now + chrono::Duration::seconds(60)));
        assert!(reader.is_healthy(now + chrono::Duration::seconds(59)));
        assert!(!reader.is_healthy(now + chrono::Duration::seconds(60)));
    }
}
