use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::status::SessionRoutes;
use crate::session::{RefreshCoordinator, SessionReader};
use crate::sources::SourceKind;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub session: SessionRoutes,
}

impl AppState {
    pub fn new(
        metrics: &Metrics,
        coordinator: RefreshCoordinator<SourceKind>,
        reader: SessionReader,
    ) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            session: SessionRoutes::new(coordinator, reader),
        }
    }
}

pub async fn router(
    settings_config: &SettingsConfig,
    coordinator: RefreshCoordinator<SourceKind>,
    reader: SessionReader,
) -> Router {
    let metrics = get_metrics().await;
    let state = AppState::new(metrics, coordinator, reader);

    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.session.router())
        .with_state(state)
}

/// Serve the status and metrics routes until `shutdown` fires
pub async fn start(
    settings_config: &SettingsConfig,
    coordinator: RefreshCoordinator<SourceKind>,
    reader: SessionReader,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(settings_config, coordinator, reader).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("http server failed");
    metrics.up.set(0);

    served
}
