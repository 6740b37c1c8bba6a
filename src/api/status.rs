//! Status routes.
//!
//! Routes:
//! - GET /health - Liveness check with uptime and version

use std::sync::OnceLock;
use std::time::Instant;

use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Envelope;
use crate::AppState;

static STARTUP_TIME: OnceLock<Instant> = OnceLock::new();

/// Record the process start time. Call once from main before serving.
pub fn init_startup_time() {
    let _ = STARTUP_TIME.get_or_init(Instant::now);
}

fn uptime_seconds() -> f64 {
    STARTUP_TIME
        .get()
        .map(|start| start.elapsed().as_secs_f64())
        .unwrap_or(0.0)
}

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: f64,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Basic health check.
///
/// GET /health
#[axum::debug_handler]
async fn health_check() -> Json<Envelope<HealthResponse>> {
    Json(Envelope::data(HealthResponse {
        status: "ok",
        uptime: uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    }))
}
