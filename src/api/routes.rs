//! API route definitions
//!
//! - /api/v1/status - Detector parameters, active window statistics, counters
//! - /api/v1/stream - Most recent stream values
//! - /api/v1/anomalies - Reported anomaly events
//! - /api/v1/config - Effective configuration

use axum::{routing::get, Router};

use super::handlers::{self, DashboardState};

/// Create all API routes for the dashboard
pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route("/stream", get(handlers::get_stream))
        .route("/anomalies", get(handlers::get_anomalies))
        .route("/config", get(handlers::get_config))
        .with_state(state)
}

/// Health endpoint at root level
pub fn root_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}
