use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::server::server::AppState;
use crate::session::{RefreshCoordinator, SessionError, SessionReader};
use crate::sources::SourceKind;
use crate::utils::constants::{ROUTE_SESSION, ROUTE_SESSION_REFRESH, ROUTE_STATUS_CHECK};

#[derive(Clone)]
pub struct SessionRoutes {
    coordinator: RefreshCoordinator<SourceKind>,
    reader: SessionReader,
}

impl SessionRoutes {
    pub fn new(coordinator: RefreshCoordinator<SourceKind>, reader: SessionReader) -> Self {
        Self { coordinator, reader }
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new()
            .route(ROUTE_STATUS_CHECK, get(status_check))
            .route(ROUTE_SESSION, get(current_session))
            .route(ROUTE_SESSION_REFRESH, post(refresh_session))
    }
}

/// `true` while a non-expired session token is committed
async fn status_check(State(state): State<AppState>) -> Response {
    let reader = &state.session.reader;
    match reader.snapshot() {
        Some(snapshot) => info!(
            "status requested: {}, expires at: {}",
            snapshot.token_id,
            snapshot.expires_at.to_rfc3339()
        ),
        None => info!("status requested before the first session was committed"),
    }

    if reader.is_healthy(Utc::now()) {
        (StatusCode::OK, Json(true)).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(false)).into_response()
    }
}

async fn current_session(State(state): State<AppState>) -> Response {
    match state.session.reader.snapshot() {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "session not initialized" })),
        )
            .into_response(),
    }
}

/// Explicit refresh: the caller sees a failed fetch instead of the stale token
async fn refresh_session(State(state): State<AppState>) -> Response {
    match state.session.coordinator.request_refresh().await {
        Ok(token_id) => {
            let body = match state.session.reader.snapshot() {
                Some(snapshot) if snapshot.token_id == token_id => json!(snapshot),
                _ => json!({ "token_id": token_id }),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            warn!("explicit refresh failed: {}", err);
            let status = match err {
                SessionError::FetchFailure(_) => StatusCode::BAD_GATEWAY,
                SessionError::RefreshAbandoned | SessionError::CancelledDuringWait => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}
