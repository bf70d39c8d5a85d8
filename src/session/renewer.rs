use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::session::coordinator::RefreshCoordinator;
use crate::session::error::SessionError;
use crate::session::reader::SessionReader;
use crate::sources::FetchToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewerPhase {
    Starting,
    Running,
    Stopped,
}

impl RenewerPhase {
    fn as_gauge(&self) -> i64 {
        match self {
            RenewerPhase::Starting => 0,
            RenewerPhase::Running => 1,
            RenewerPhase::Stopped => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenewerSettings {
    /// cadence of the background loop, also the token lifetime
    pub refresh_interval: Duration,
    /// how long before expiry a renewal starts
    pub renewal_lead: Duration,
    /// shorter wait used after a failed refresh
    pub failure_retry_delay: Duration,
    /// attempts for the initial refresh before startup is declared failed
    pub startup_retry: RetrySettings,
}

/// Keeps the session fresh by refreshing it on a fixed interval.
///
/// `start` consumes the renewer, so a stopped renewer cannot be restarted.
pub struct BackgroundRenewer<S> {
    coordinator: RefreshCoordinator<S>,
    settings: RenewerSettings,
    phase: watch::Sender<RenewerPhase>,
}

impl<S> BackgroundRenewer<S>
where
    S: FetchToken + Send + Sync + 'static,
{
    pub fn new(coordinator: RefreshCoordinator<S>, settings: RenewerSettings) -> Self {
        let (phase, _) = watch::channel(RenewerPhase::Starting);
        Self {
            coordinator,
            settings,
            phase,
        }
    }

    pub fn phase(&self) -> watch::Receiver<RenewerPhase> {
        self.phase.subscribe()
    }

    /// Perform the initial refresh, then spawn the renewal loop.
    ///
    /// The initial refresh is retried per `startup_retry`; once those attempts
    /// are exhausted the error is returned and the renewer is stopped.
    pub async fn start(self, cancel: CancellationToken) -> Result<RenewerHandle, SessionError> {
        set_phase(&self.phase, RenewerPhase::Starting).await;

        let coordinator = self.coordinator.clone();
        let initial = self
            .settings
            .startup_retry
            .run_with_retry(&cancel, || coordinator.request_refresh())
            .await;

        let token_id = match initial {
            Ok(token_id) => token_id,
            Err(err) => {
                set_phase(&self.phase, RenewerPhase::Stopped).await;
                return Err(err);
            }
        };
        info!("initial session id: {}", token_id);

        let reader = SessionReader::new(self.coordinator.state().clone());
        let phase = self.phase.subscribe();
        set_phase(&self.phase, RenewerPhase::Running).await;

        let task = tokio::spawn(run_loop(self.coordinator, self.settings, cancel.clone(), self.phase));

        Ok(RenewerHandle {
            cancel,
            task,
            phase,
            reader,
        })
    }
}

async fn run_loop<S>(
    coordinator: RefreshCoordinator<S>,
    settings: RenewerSettings,
    cancel: CancellationToken,
    phase: watch::Sender<RenewerPhase>,
) where
    S: FetchToken + Send + Sync + 'static,
{
    let mut delay = until_renewal(&coordinator, &settings);

    loop {
        debug!("next background refresh in {:?}", delay);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = sleep(delay) => {}
        }

        let refreshed = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            refreshed = coordinator.request_refresh() => refreshed,
        };

        delay = match refreshed {
            Ok(token_id) => {
                debug!("background refresh kept session {}", token_id);
                until_renewal(&coordinator, &settings)
            }
            Err(err) => {
                warn!(
                    "background refresh failed, retrying in {:?}: {}",
                    settings.failure_retry_delay, err
                );
                settings.failure_retry_delay
            }
        };
    }

    info!("background renewer stopped");
    set_phase(&phase, RenewerPhase::Stopped).await;
}

/// Time left until the committed session is `renewal_lead` away from expiry.
///
/// Never earlier than the cooldown allows, so the renewal always fetches.
fn until_renewal<S>(coordinator: &RefreshCoordinator<S>, settings: &RenewerSettings) -> Duration
where
    S: FetchToken + Send + Sync + 'static,
{
    let renew_after = settings
        .refresh_interval
        .saturating_sub(settings.renewal_lead)
        .max(coordinator.settings().cooldown);

    match coordinator.state().read() {
        Some(snapshot) => (snapshot.refreshed_instant + renew_after).saturating_duration_since(Instant::now()),
        None => renew_after,
    }
}

async fn set_phase(phase: &watch::Sender<RenewerPhase>, next: RenewerPhase) {
    phase.send_replace(next);
    get_metrics().await.renewer_phase.set(next.as_gauge());
}

/// Running renewer. Dropping the handle leaves the loop running until its
/// cancellation token fires.
pub struct RenewerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    phase: watch::Receiver<RenewerPhase>,
    reader: SessionReader,
}

impl RenewerHandle {
    pub fn reader(&self) -> SessionReader {
        self.reader.clone()
    }

    pub fn phase(&self) -> RenewerPhase {
        *self.phase.borrow()
    }

    /// Signal the loop and wait for it to exit
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            warn!("background renewer task ended abnormally: {}", err);
        }
    }
}
