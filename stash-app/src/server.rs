//! Router assembly.

use axum::extract::DefaultBodyLimit;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use stash_protocol::limits::MAX_UPLOAD_BYTES;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{files, text};
use crate::state::AppState;

/// Headroom for multipart framing on top of the aggregate upload limit.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/", get(api_info))
        .route("/api/upload", post(files::upload).get(files::upload_info))
        .route("/api/download/{code}", get(files::download))
        .route("/api/status/{code}", get(files::status))
        .route("/api/text/send", post(text::send))
        .route("/api/text/stats", get(text::stats))
        .route("/api/text/status/{code}", get(text::status))
        .route("/api/text/{code}", get(text::get))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_LIMIT_SLACK))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "message": "stash file sharing API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "GET /api/download/{code}",
            "api_info": "GET /api/",
        },
    }))
}

async fn api_info() -> Json<serde_json::Value> {
    Json(json!({
        "message": "stash file sharing API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "download": "GET /api/download/{code}",
            "status": "GET /api/status/{code}",
            "text_send": "POST /api/text/send",
            "text_get": "GET /api/text/{code}",
        },
    }))
}
