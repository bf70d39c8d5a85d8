use anyhow::{Context, Result};
use clap::Parser;
use session_fresher::server;
use session_fresher::session::{BackgroundRenewer, RefreshCoordinator, SessionState};
use session_fresher::sources::build_source;
use session_fresher::utils::config_loader;
use session_fresher::utils::constants::DEFAULT_CONFIG_PATH;
use session_fresher::utils::logging::{self, LogLevel};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL" , value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build token source and refresh coordinator
    // -------------------------------

    let source = build_source(&service_config.source)?;
    let session = &service_config.session;
    info!("token source: {}", source.name());

    let state = SessionState::new(session.renewer_settings().refresh_interval);
    let coordinator = RefreshCoordinator::new(source, state, session.coordinator_settings());

    // -------------------------------
    // 3. Initial refresh, then background renewal
    // -------------------------------

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));

    let renewer = match BackgroundRenewer::new(coordinator.clone(), session.renewer_settings())
        .start(shutdown.child_token())
        .await
    {
        Ok(renewer) => renewer,
        Err(err) if err.is_cancelled() => {
            info!("shutdown requested before the initial session refresh completed");
            return Ok(());
        }
        Err(err) => return Err(err).context("initial session refresh failed"),
    };

    // -------------------------------
    // 4. Serve status endpoint until shutdown
    // -------------------------------

    info!("Service starting...");
    let served = server::server::start(
        &service_config.settings,
        coordinator,
        renewer.reader(),
        shutdown.clone(),
    )
    .await;

    shutdown.cancel();
    renewer.stop().await;
    info!("Service stopped");
    served
}

async fn wait_for_shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(err) => {
                warn!("cannot listen for SIGTERM: {}", err);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown requested");
    shutdown.cancel();
}
