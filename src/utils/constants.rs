//! Shared constants and defaults

pub const DEFAULT_CONFIG_PATH: &str = "session-fresher.yaml";

pub const DEFAULT_REFRESH_COOLDOWN_SECS: u64 = 10;
pub const DEFAULT_FAILURE_RETRY_DELAY_MINUTES: u64 = 1;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_STARTUP_ATTEMPTS: u32 = 3;
pub const DEFAULT_STARTUP_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_STARTUP_MAX_DELAY_MS: u64 = 5000;

pub const DEFAULT_SIMULATED_LATENCY_MS: u64 = 500;

// Routes
pub const ROUTE_STATUS_CHECK: &str = "/api/statuscheck";
pub const ROUTE_SESSION: &str = "/api/session";
pub const ROUTE_SESSION_REFRESH: &str = "/api/session/refresh";

pub const DEFAULT_STATUS_URL: &str = "http://localhost:5193/api/statuscheck";
