use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::session::error::SessionError;

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetrySettings {
    /// Run `operation` until it succeeds or attempts run out, doubling the delay
    /// between attempts up to `max_delay_ms`. Cancellation ends both the attempt
    /// and the backoff wait.
    pub async fn run_with_retry<F, Fut, T>(
        &self,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, SessionError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, SessionError>>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.base_delay_ms;

        for attempt in 1..=attempts {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SessionError::CancelledDuringWait),
                outcome = operation() => outcome,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    warn!("Attempt {attempt}/{attempts} failed: {e}");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(SessionError::CancelledDuringWait),
                        _ = sleep(Duration::from_millis(delay)) => {}
                    }
                    delay = self.next_delay(delay);
                }
                Err(e) => {
                    error!("all {attempt} attempts failed: {e}");
                    return Err(e);
                }
            }
        }
        unreachable!("Retry loop exhausted unexpectedly")
    }

    fn next_delay(&self, delay: u64) -> u64 {
        delay.saturating_mul(2).min(self.max_delay_ms)
    }
}
