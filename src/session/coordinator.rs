//! Single-flight refresh with a cooldown gate.
//!
//! Every caller goes through [`RefreshCoordinator::request_refresh`]. Under one
//! short critical section the coordinator decides between three outcomes:
//! - join the fetch that is already in flight and share its result,
//! - return the committed token when the last refresh completed less than
//!   `cooldown` ago,
//! - start a new fetch.
//!
//! The fetch itself runs in its own task outside the lock, so a caller that
//! gives up waiting never cancels the refresh for everybody else.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::observability::metrics::{
    get_metrics, OUTCOME_COOLDOWN, OUTCOME_FETCHED, OUTCOME_JOINED, REASON_ERROR, REASON_TIMEOUT,
};
use crate::session::error::SessionError;
use crate::session::state::SessionState;
use crate::session::token::TokenId;
use crate::sources::FetchToken;

type RefreshOutcome = Result<TokenId, SessionError>;
type InFlight = watch::Receiver<Option<RefreshOutcome>>;

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub cooldown: Duration,
    pub fetch_timeout: Duration,
}

pub struct RefreshCoordinator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for RefreshCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<S> {
    source: S,
    state: SessionState,
    settings: CoordinatorSettings,
    /// completion signal of the fetch currently running, if any
    in_flight: Mutex<Option<InFlight>>,
}

enum Decision {
    Join(InFlight),
    Cooldown(TokenId),
    Start(InFlight),
}

impl<S> RefreshCoordinator<S>
where
    S: FetchToken + Send + Sync + 'static,
{
    pub fn new(source: S, state: SessionState, settings: CoordinatorSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                state,
                settings,
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.inner.state
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.inner.settings
    }

    /// Refresh the session token, deduplicated against concurrent callers.
    ///
    /// Callers overlapping one fetch all receive its result, including its failure.
    /// Within the cooldown window the committed token is returned without a fetch.
    pub async fn request_refresh(&self) -> Result<TokenId, SessionError> {
        let metrics = get_metrics().await;

        let mut completion = match self.decide() {
            Decision::Cooldown(token_id) => {
                debug!("refresh requested within cooldown, keeping session {}", token_id);
                metrics.refresh_requests.with_label_values(&[OUTCOME_COOLDOWN]).inc();
                return Ok(token_id);
            }
            Decision::Join(completion) => {
                debug!("refresh already in flight, joining it");
                metrics.refresh_requests.with_label_values(&[OUTCOME_JOINED]).inc();
                completion
            }
            Decision::Start(completion) => {
                metrics.refresh_requests.with_label_values(&[OUTCOME_FETCHED]).inc();
                completion
            }
        };

        let outcome = match completion.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(SessionError::RefreshAbandoned)),
            Err(_) => Err(SessionError::RefreshAbandoned),
        };
        outcome
    }

    /// In-flight check and cooldown check, taken as one decision
    fn decide(&self) -> Decision {
        let mut slot = lock_slot(&self.inner.in_flight);

        if let Some(completion) = slot.as_ref() {
            return Decision::Join(completion.clone());
        }

        if let Some(snapshot) = self.inner.state.read() {
            if snapshot.age() < self.inner.settings.cooldown {
                return Decision::Cooldown(snapshot.token_id);
            }
        }

        let (publisher, completion) = watch::channel(None);
        *slot = Some(completion.clone());
        drop(slot);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let outcome = {
                let _clear_on_exit = InFlightGuard(&inner.in_flight);
                inner.fetch_and_commit().await
            };
            publisher.send_replace(Some(outcome));
        });

        Decision::Start(completion)
    }
}

impl<S> Inner<S>
where
    S: FetchToken + Send + Sync + 'static,
{
    async fn fetch_and_commit(&self) -> RefreshOutcome {
        let metrics = get_metrics().await;
        let start = Instant::now();

        let fetched = tokio::time::timeout(self.settings.fetch_timeout, self.source.fetch_token()).await;
        metrics.fetch_duration.observe(start.elapsed().as_secs_f64());

        match fetched {
            Ok(Ok(token_id)) => {
                let snapshot = self.state.commit(token_id, Utc::now());
                metrics.session_expiry_unix.set(snapshot.expires_at.timestamp());
                info!(
                    "session refreshed: {}, expires at: {}",
                    snapshot.token_id,
                    snapshot.expires_at.to_rfc3339()
                );
                Ok(token_id)
            }
            Ok(Err(err)) => {
                error!("failed to fetch session token: {:#}", err);
                metrics.fetch_failures.with_label_values(&[REASON_ERROR]).inc();
                Err(SessionError::fetch_failure(err))
            }
            Err(_) => {
                error!("session token fetch timed out after {:?}", self.settings.fetch_timeout);
                metrics.fetch_failures.with_label_values(&[REASON_TIMEOUT]).inc();
                Err(SessionError::fetch_failure(anyhow!(
                    "timed out after {:?}",
                    self.settings.fetch_timeout
                )))
            }
        }
    }
}

fn lock_slot(slot: &Mutex<Option<InFlight>>) -> MutexGuard<'_, Option<InFlight>> {
    // the slot holds no invariant a panicking holder could break
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight slot when the fetch task finishes or unwinds
struct InFlightGuard<'a>(&'a Mutex<Option<InFlight>>);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock_slot(self.0).take();
    }
}
