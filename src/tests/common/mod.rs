// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use tokio::time::Instant;

use crate::session::{CoordinatorSettings, RefreshCoordinator, SessionState, TokenId};
use crate::sources::FetchToken;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Token source with scripted latency and failures that records every call
#[derive(Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<ScriptedInner>,
}

#[derive(Default)]
struct ScriptedInner {
    latency: Duration,
    calls: AtomicUsize,
    fail_all: AtomicBool,
    /// 1-based call numbers that fail
    failing_calls: Mutex<HashSet<usize>>,
    call_instants: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                latency,
                ..Default::default()
            }),
        }
    }

    pub fn fail_all(&self, fail: bool) {
        self.inner.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_calls(&self, calls: &[usize]) {
        self.inner.failing_calls.lock().unwrap().extend(calls.iter().copied());
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.inner.call_instants.lock().unwrap().clone()
    }
}

impl FetchToken for ScriptedSource {
    async fn fetch_token(&self) -> Result<TokenId> {
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.call_instants.lock().unwrap().push(Instant::now());

        tokio::time::sleep(self.inner.latency).await;

        let scripted_failure = self.inner.failing_calls.lock().unwrap().contains(&call);
        if scripted_failure || self.inner.fail_all.load(Ordering::SeqCst) {
            return Err(anyhow!("remote issuer unavailable (call {})", call));
        }
        Ok(TokenId::random())
    }
}

pub const INTERVAL: Duration = Duration::from_secs(60);
pub const COOLDOWN: Duration = Duration::from_secs(10);

pub fn coordinator_with(
    source: ScriptedSource,
    fetch_timeout: Duration,
) -> RefreshCoordinator<ScriptedSource> {
    RefreshCoordinator::new(
        source,
        SessionState::new(INTERVAL),
        CoordinatorSettings {
            cooldown: COOLDOWN,
            fetch_timeout,
        },
    )
}

pub fn coordinator(source: ScriptedSource) -> RefreshCoordinator<ScriptedSource> {
    coordinator_with(source, Duration::from_secs(30))
}
