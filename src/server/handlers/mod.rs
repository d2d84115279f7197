//! Check server HTTP handlers.

mod auth;
mod check;
mod health;

pub use auth::require_bearer;
pub use check::check_handler;
pub use health::health_handler;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::types::ErrorBody;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}
