//! File upload, download, and status handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use stash_files::{ServiceError, ZIP_NAME};
use stash_protocol::api::{FileStatusResponse, UploadResponse};
use stash_protocol::limits::{MAX_UPLOAD_BYTES, MAX_UPLOAD_FILES};
use stash_store::StoreError;
use tokio_util::io::ReaderStream;

use super::error_body;
use crate::state::AppState;

/// `POST /api/upload`: one file stored as-is, several zipped into one blob.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("files") {
                    continue;
                }
                let name = field.file_name().unwrap_or("file").to_string();
                match field.bytes().await {
                    Ok(bytes) => files.push((name, bytes.to_vec())),
                    Err(e) => {
                        return error_body(
                            StatusCode::BAD_REQUEST,
                            format!("Malformed upload: {e}"),
                        )
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return error_body(StatusCode::BAD_REQUEST, format!("Malformed upload: {e}"))
            }
        }
    }

    if files.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "No files uploaded");
    }
    if files.len() > MAX_UPLOAD_FILES {
        return error_body(StatusCode::BAD_REQUEST, "Maximum 20 files allowed");
    }
    let total_size: usize = files.iter().map(|(_, bytes)| bytes.len()).sum();
    if total_size > MAX_UPLOAD_BYTES {
        return error_body(StatusCode::BAD_REQUEST, "Total file size exceeds 200MB");
    }

    if files.len() == 1 {
        let (name, bytes) = files.remove(0);
        if bytes.is_empty() {
            return error_body(StatusCode::BAD_REQUEST, "File is empty");
        }
        match state.files.save_file(&name, bytes).await {
            Ok(code) => Json(UploadResponse {
                code,
                filename: name,
                zipped: false,
                file_count: 1,
            })
            .into_response(),
            Err(e) => upload_error(e),
        }
    } else {
        let file_count = files.len();
        match state.files.save_many_as_zip(files).await {
            Ok(code) => Json(UploadResponse {
                code,
                filename: ZIP_NAME.to_string(),
                zipped: true,
                file_count,
            })
            .into_response(),
            Err(e) => upload_error(e),
        }
    }
}

fn upload_error(err: ServiceError) -> Response {
    match &err {
        ServiceError::Store(
            StoreError::ExhaustedRetries { .. } | StoreError::CapacityExceeded { .. },
        ) => error_body(StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        _ => {
            tracing::error!(error = %err, "upload failed");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to upload file: {err}"),
            )
        }
    }
}

/// `GET /api/upload`: usage hint for clients poking the endpoint by hand.
pub async fn upload_info() -> Response {
    Json(json!({
        "message": "This endpoint requires a POST request with one or more files",
        "method": "POST",
        "endpoint": "/api/upload",
        "parameter": "files (multipart/form-data)",
        "limits": {
            "maxFiles": MAX_UPLOAD_FILES,
            "maxTotalSize": "200MB",
        },
    }))
    .into_response()
}

/// `GET /api/download/{code}`: stream the stored bytes, marking the entry
/// downloaded. The flag is informational; downloads are repeatable.
pub async fn download(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.files.retrieve(&code).await {
        Ok((snap, reader)) => {
            let file = snap.payload;
            let content_type = mime_guess::from_path(&file.display_name)
                .first_raw()
                .unwrap_or("application/octet-stream");
            let headers = [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.display_name),
                ),
                (header::CONTENT_LENGTH, file.size.to_string()),
            ];
            (headers, Body::from_stream(ReaderStream::new(reader))).into_response()
        }
        Err(e) if e.is_not_found() => {
            (StatusCode::NOT_FOUND, "Invalid or expired code").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "download failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to download file")
        }
    }
}

/// `GET /api/status/{code}`: non-consuming download status.
pub async fn status(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.files.status(&code) {
        Ok(snap) => Json(FileStatusResponse {
            downloaded: snap.consumed,
            // A found entry is by definition not expired: expired entries
            // are evicted the moment a lookup observes them.
            expired: false,
            filename: snap.payload.display_name,
        })
        .into_response(),
        Err(e) if e.is_not_found() => error_body(StatusCode::NOT_FOUND, "File not found"),
        Err(e) => {
            tracing::error!(error = %e, "status query failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to query status")
        }
    }
}
