//! Check server data structures.

use std::sync::Arc;

use serde::Serialize;

use crate::check::Prober;
use crate::error_handling::CheckStatsSnapshot;

/// Shared state for the check server
#[derive(Clone)]
pub struct AppState {
    pub prober: Arc<Prober>,
}

/// JSON response for `/health`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub region: String,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub checks: CheckStatsSnapshot,
}

/// JSON body of every non-2xx response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
