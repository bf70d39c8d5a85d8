use prometheus::{HistogramOpts, Histogram, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const OUTCOME_FETCHED: &str = "fetched";
pub const OUTCOME_JOINED: &str = "joined";
pub const OUTCOME_COOLDOWN: &str = "cooldown";

pub const REASON_ERROR: &str = "error";
pub const REASON_TIMEOUT: &str = "timeout";

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async { 
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Refresh coordination
    pub refresh_requests: IntCounterVec,
    pub fetch_failures: IntCounterVec,
    pub fetch_duration: Histogram,

    // Session state
    pub session_expiry_unix: IntGauge,
    pub renewer_phase: IntGauge,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("sessionfresher".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            refresh_requests: IntCounterVec::new(Opts::new("refresh_requests_total","Refresh requests by outcome",),&["outcome"],).unwrap(),
            fetch_failures: IntCounterVec::new(Opts::new("fetch_failures_total", "Token source failures by reason"),&["reason"],).unwrap(),
            fetch_duration: Histogram::with_opts(HistogramOpts::new("fetch_duration_seconds", "Token source fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])).unwrap(),

            session_expiry_unix: IntGauge::new("session_expiry_unix_seconds", "Expiration of the committed session token").unwrap(),
            renewer_phase: IntGauge::new("renewer_phase", "0 starting, 1 running, 2 stopped").unwrap(),

            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.refresh_requests.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.session_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.renewer_phase.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
