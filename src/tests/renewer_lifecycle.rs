#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::resilience::retry::RetrySettings;
    use crate::session::{BackgroundRenewer, RenewerPhase, RenewerSettings, SessionError};
    use crate::tests::common::{coordinator, ScriptedSource, INTERVAL};

    const LEAD: Duration = Duration::from_secs(5);

    fn settings(refresh_interval: Duration, failure_retry_delay: Duration) -> RenewerSettings {
        RenewerSettings {
            refresh_interval,
            renewal_lead: LEAD,
            failure_retry_delay,
            startup_retry: RetrySettings {
                attempts: 3,
                base_delay_ms: 100,
                max_delay_ms: 1000,
            },
        }
    }

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_secs(1),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn token_is_available_as_soon_as_start_returns() {
        let source = ScriptedSource::new(Duration::from_millis(500));
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));

        let handle = renewer.start(CancellationToken::new()).await.unwrap();

        assert_eq!(handle.phase(), RenewerPhase::Running);
        assert!(handle.reader().token_id().is_some());
        assert!(handle.reader().is_healthy(chrono::Utc::now()));
        assert_eq!(source.calls(), 1);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn renews_ahead_of_each_expiry() {
        let source = ScriptedSource::new(Duration::ZERO);
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));

        let handle = renewer.start(CancellationToken::new()).await.unwrap();
        let first = handle.reader().token_id();

        // renewals at 55s and 110s
        tokio::time::sleep(Duration::from_secs(150)).await;

        assert_eq!(source.calls(), 3);
        assert_ne!(handle.reader().token_id(), first);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_renewal_commits_before_the_previous_token_expires() {
        // latency close to the lead: a renewal started at expiry would leave a stale gap
        let source = ScriptedSource::new(Duration::from_secs(4));
        let coordinator = coordinator(source.clone());
        let mut commits = coordinator.state().subscribe();
        let renewer = BackgroundRenewer::new(coordinator, settings(INTERVAL, minutes(1)));

        let handle = renewer.start(CancellationToken::new()).await.unwrap();
        let mut previous = commits.borrow_and_update().unwrap();

        for _ in 0..3 {
            tokio::time::timeout(minutes(2), commits.changed())
                .await
                .expect("renewal should commit within two intervals")
                .unwrap();
            let renewed = commits.borrow_and_update().unwrap();

            let gap = renewed.refreshed_instant - previous.refreshed_instant;
            assert!(gap < INTERVAL, "renewal landed {:?} after the previous commit", gap);
            let renewed_at = previous.refreshed_at + chrono::Duration::from_std(gap).unwrap();
            assert!(previous.is_fresh_at(renewed_at));
            assert_ne!(renewed.token_id, previous.token_id);
            previous = renewed;
        }

        assert!(handle.reader().is_healthy(chrono::Utc::now()));
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_retried_after_retry_delay_not_full_interval() {
        let source = ScriptedSource::new(Duration::ZERO);
        // call 1 is the startup refresh, call 2 the first background one
        source.fail_calls(&[2]);
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(5), minutes(1)));

        let handle = renewer.start(CancellationToken::new()).await.unwrap();
        let committed = handle.reader().snapshot();

        tokio::time::sleep(minutes(7)).await;

        let instants = source.call_instants();
        assert_eq!(instants.len(), 3);
        assert_close(instants[1] - instants[0], minutes(5) - LEAD);
        assert_close(instants[2] - instants[1], minutes(1));
        assert_ne!(handle.reader().snapshot(), committed);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_interval_wait_is_prompt_and_final() {
        let source = ScriptedSource::new(Duration::ZERO);
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));
        let phase = renewer.phase();

        let handle = renewer.start(CancellationToken::new()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        tokio::time::timeout(Duration::from_millis(10), handle.stop())
            .await
            .expect("renewer should stop without waiting out the interval");

        tokio::time::sleep(minutes(60)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(*phase.borrow(), RenewerPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_the_loop() {
        let source = ScriptedSource::new(Duration::ZERO);
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));
        let mut phase = renewer.phase();
        let shutdown = CancellationToken::new();

        let _handle = renewer.start(shutdown.child_token()).await.unwrap();
        shutdown.cancel();

        phase
            .wait_for(|p| *p == RenewerPhase::Stopped)
            .await
            .unwrap();
        tokio::time::sleep(minutes(10)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn startup_failure_is_fatal_after_retries() {
        let source = ScriptedSource::new(Duration::ZERO);
        source.fail_all(true);
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));
        let phase = renewer.phase();

        let result = renewer.start(CancellationToken::new()).await;

        assert!(matches!(result, Err(SessionError::FetchFailure(_))));
        assert_eq!(source.calls(), 3);
        assert_eq!(*phase.borrow(), RenewerPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_initial_fetch_is_prompt() {
        let source = ScriptedSource::new(Duration::from_secs(20));
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));
        let phase = renewer.phase();
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let begun = tokio::time::Instant::now();

        let result = renewer.start(shutdown).await;

        assert!(matches!(result, Err(SessionError::CancelledDuringWait)));
        assert!(begun.elapsed() < Duration::from_secs(2));
        assert_eq!(source.calls(), 1);
        assert_eq!(*phase.borrow(), RenewerPhase::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn startup_recovers_within_retry_budget() {
        let source = ScriptedSource::new(Duration::ZERO);
        source.fail_calls(&[1]);
        let renewer = BackgroundRenewer::new(coordinator(source.clone()), settings(minutes(1), minutes(1)));

        let handle = renewer.start(CancellationToken::new()).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert!(handle.reader().token_id().is_some());
        handle.stop().await;
    }
}
