//! Liveness handler.

use axum::extract::State;
use axum::Json;

use super::super::types::{AppState, HealthResponse};

/// Unauthenticated liveness endpoint with process identity and outcome counters
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let prober = &state.prober;
    Json(HealthResponse {
        status: "ok",
        region: prober.config().region.clone(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: prober.uptime().as_secs(),
        checks: prober.stats().snapshot(),
    })
}
