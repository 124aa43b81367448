//! HTTP request handlers.

pub mod files;
pub mod text;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use stash_protocol::api::ErrorResponse;

/// JSON error body shared by every failing endpoint.
pub(crate) fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
