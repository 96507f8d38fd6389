//! API route handlers
//!
//! All `/api/v1` handlers read a snapshot of [`AppState`] under the read
//! lock and return it wrapped in [`ApiResponse`].

use axum::extract::{Query, State};
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::defaults::DASHBOARD_DEFAULT_TAIL;
use crate::detector::{Window, WindowStats};
use crate::pipeline::AppState;
use crate::types::{AnomalyEvent, Sample};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct DashboardState {
    /// Application state written by the tick loop
    pub app_state: Arc<RwLock<AppState>>,
}

impl DashboardState {
    pub fn new(app_state: Arc<RwLock<AppState>>) -> Self {
        Self { app_state }
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// `/api/v1/status`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub source: String,
    pub uptime_secs: u64,
    pub samples: usize,
    pub anomalies: usize,
    pub window_capacity: usize,
    pub threshold: f64,
    /// Global index of the first sample in the active window
    pub window_offset: usize,
    /// Active window statistics; absent before the first sample
    pub window: Option<WindowStats>,
    pub latest: Option<Sample>,
    pub last_update: Option<DateTime<Utc>>,
}

/// `/api/v1/stream`
#[derive(Debug, Serialize)]
pub struct StreamSlice {
    /// Global index of `values[0]`
    pub offset: usize,
    pub total: usize,
    pub values: Vec<f64>,
}

/// `/api/v1/anomalies`
#[derive(Debug, Serialize)]
pub struct AnomalyList {
    pub total: usize,
    pub events: Vec<AnomalyEvent>,
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub tail: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AnomalyQuery {
    pub since: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check(State(state): State<DashboardState>) -> Json<HealthResponse> {
    let app_state = state.app_state.read().await;
    Json(HealthResponse {
        status: app_state.status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: app_state.uptime_secs(),
    })
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<DashboardState>) -> Response {
    let app_state = state.app_state.read().await;
    let window = Window::of(&app_state.stream, app_state.window_capacity);

    ApiResponse::ok(StatusResponse {
        status: app_state.status.to_string(),
        source: app_state.source_name.clone(),
        uptime_secs: app_state.uptime_secs(),
        samples: app_state.stream.len(),
        anomalies: app_state.anomalies.len(),
        window_capacity: app_state.window_capacity,
        threshold: app_state.threshold,
        window_offset: window.offset(),
        window: window.stats(),
        latest: app_state.stream.last().map(|&value| Sample {
            index: app_state.stream.len() - 1,
            value,
        }),
        last_update: app_state.last_update,
    })
}

/// GET /api/v1/stream?tail=N
///
/// The most recent `N` values (default 500).
pub async fn get_stream(State(state): State<DashboardState>, Query(query): Query<StreamQuery>) -> Response {
    let tail = query.tail.unwrap_or(DASHBOARD_DEFAULT_TAIL);
    if tail == 0 {
        return ApiErrorResponse::bad_request("tail must be > 0");
    }

    let app_state = state.app_state.read().await;
    let total = app_state.stream.len();
    let offset = total.saturating_sub(tail);

    ApiResponse::ok(StreamSlice {
        offset,
        total,
        values: app_state.stream[offset..].to_vec(),
    })
}

/// GET /api/v1/anomalies?since=I
///
/// Reported anomalies with `global_index >= I` (default: all).
pub async fn get_anomalies(State(state): State<DashboardState>, Query(query): Query<AnomalyQuery>) -> Response {
    let app_state = state.app_state.read().await;
    let since = query.since.unwrap_or(0);
    let start = app_state.anomalies.partition_point(|e| e.global_index < since);

    ApiResponse::ok(AnomalyList {
        total: app_state.anomalies.len(),
        events: app_state.anomalies[start..].to_vec(),
    })
}

/// GET /api/v1/config
pub async fn get_config() -> Response {
    ApiResponse::ok(crate::config::get().clone())
}
