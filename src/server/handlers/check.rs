//! Check handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::super::types::AppState;
use super::error_response;
use crate::check::CheckRequest;

/// Runs the posted check and returns its result.
///
/// A body that isn't a check request, or one that fails validation, is a 400;
/// everything else is a 200 carrying the result, whatever its status.
pub async fn check_handler(
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            state.prober.stats().record_rejected();
            log::debug!("Rejected check body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.prober.run_check(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}
