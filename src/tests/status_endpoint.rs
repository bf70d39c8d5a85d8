#[cfg(test)]
mod test {
    use std::time::Duration;

    use http::StatusCode;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;

    use crate::config::settings::{MetricsConfig, ServerConfig, SettingsConfig};
    use crate::config::sources::SimulatedSourceConfig;
    use crate::resilience::retry::RetrySettings;
    use crate::server::server::router;
    use crate::session::{
        BackgroundRenewer, CoordinatorSettings, RefreshCoordinator, RenewerSettings, SessionReader,
        SessionState,
    };
    use crate::sources::simulated::SimulatedSource;
    use crate::sources::SourceKind;
    use crate::tests::common::{build_reqwest_client, spawn_axum};

    fn settings() -> SettingsConfig {
        SettingsConfig {
            metrics: MetricsConfig { path: "/metrics".into(), is_enabled: true },
            server: ServerConfig { host: "127.0.0.1".into(), port: "0".into() },
            logging: None,
        }
    }

    fn coordinator() -> RefreshCoordinator<SourceKind> {
        let source = SourceKind::Simulated(SimulatedSource::new(&SimulatedSourceConfig { latency_ms: 0 }));
        RefreshCoordinator::new(
            source,
            SessionState::new(Duration::from_secs(60)),
            CoordinatorSettings {
                cooldown: Duration::from_secs(10),
                fetch_timeout: Duration::from_secs(5),
            },
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serves_status_session_and_explicit_refresh() {
        let coordinator = coordinator();
        let renewer = BackgroundRenewer::new(
            coordinator.clone(),
            RenewerSettings {
                refresh_interval: Duration::from_secs(60),
                renewal_lead: Duration::from_secs(5),
                failure_retry_delay: Duration::from_secs(60),
                startup_retry: RetrySettings { attempts: 1, base_delay_ms: 10, max_delay_ms: 10 },
            },
        );
        let handle = renewer.start(CancellationToken::new()).await.unwrap();
        let token_id = handle.reader().token_id().unwrap().to_string();

        let app = router(&settings(), coordinator, handle.reader()).await;
        let (server, addr) = spawn_axum(app).await;
        let client = build_reqwest_client();

        let status = client.get(format!("http://{}/api/statuscheck", addr)).send().await.unwrap();
        assert_eq!(status.status(), StatusCode::OK);
        assert_eq!(status.json::<Value>().await.unwrap(), Value::Bool(true));

        let session: Value = client
            .get(format!("http://{}/api/session", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(session["token_id"], Value::String(token_id.clone()));
        assert!(session["expires_at"].is_string());

        // inside the cooldown window the explicit refresh returns the committed token
        let refreshed = client.post(format!("http://{}/api/session/refresh", addr)).send().await.unwrap();
        assert_eq!(refreshed.status(), StatusCode::OK);
        let refreshed: Value = refreshed.json().await.unwrap();
        assert_eq!(refreshed["token_id"], Value::String(token_id));

        let metrics = client
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(metrics.contains("sessionfresher_refresh_requests_total"));

        server.abort();
        handle.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reports_unavailable_before_first_refresh() {
        let coordinator = coordinator();
        let reader = SessionReader::new(coordinator.state().clone());

        let app = router(&settings(), coordinator, reader).await;
        let (server, addr) = spawn_axum(app).await;
        let client = build_reqwest_client();

        let status = client.get(format!("http://{}/api/statuscheck", addr)).send().await.unwrap();
        assert_eq!(status.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status.json::<Value>().await.unwrap(), Value::Bool(false));

        let session = client.get(format!("http://{}/api/session", addr)).send().await.unwrap();
        assert_eq!(session.status(), StatusCode::SERVICE_UNAVAILABLE);

        server.abort();
    }
}
