//! Text send, view, status, and stats handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use stash_protocol::api::{
    TextGetResponse, TextSendRequest, TextSendResponse, TextStatsResponse, TextStatusResponse,
};
use stash_protocol::Code;
use stash_store::StoreError;

use super::error_body;
use crate::state::AppState;

/// `POST /api/text/send`.
pub async fn send(State(state): State<AppState>, Json(req): Json<TextSendRequest>) -> Response {
    if req.text.trim().is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "Text cannot be empty");
    }

    match state.texts.insert(req.text) {
        Ok(code) => Json(TextSendResponse { code }).into_response(),
        Err(StoreError::TooLarge { .. }) => error_body(
            StatusCode::BAD_REQUEST,
            "Text size exceeds maximum limit of 2MB",
        ),
        Err(StoreError::CapacityExceeded { .. }) => error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "Storage limit reached. Please try again later.",
        ),
        Err(StoreError::ExhaustedRetries { .. }) => error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "Unable to generate unique code. Please try again.",
        ),
        Err(e) => {
            tracing::error!(error = %e, "text insert failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save text")
        }
    }
}

/// `GET /api/text/{code}`: view the text, marking it viewed. Viewing again
/// still succeeds; the flag is informational.
pub async fn get(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    if Code::parse(&code).is_none() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Invalid code format. Code must be 6 digits.",
        );
    }

    match state.texts.lookup(&code) {
        Ok(snap) => Json(TextGetResponse {
            text: snap.payload,
            viewed: snap.consumed,
        })
        .into_response(),
        Err(StoreError::NotFound) => error_body(StatusCode::NOT_FOUND, "Invalid or expired code"),
        Err(e) => {
            tracing::error!(error = %e, "text lookup failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch text")
        }
    }
}

/// `GET /api/text/status/{code}`: non-consuming view status.
pub async fn status(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    if Code::parse(&code).is_none() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Invalid code format. Code must be 6 digits.",
        );
    }

    match state.texts.peek(&code) {
        Ok(snap) => Json(TextStatusResponse {
            viewed: snap.consumed,
            expired: false,
        })
        .into_response(),
        Err(StoreError::NotFound) => error_body(StatusCode::NOT_FOUND, "Text not found or expired"),
        Err(e) => {
            tracing::error!(error = %e, "text status query failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to query status")
        }
    }
}

/// `GET /api/text/stats`: capacity utilization of the text store.
pub async fn stats(State(state): State<AppState>) -> Response {
    let stats = state.texts.stats();
    Json(TextStatsResponse {
        total_stored: stats.count,
        max_capacity: stats.capacity,
        utilization_percent: stats.utilization_percent,
    })
    .into_response()
}
