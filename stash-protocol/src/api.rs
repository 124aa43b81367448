//! JSON payload types for the HTTP API.
//!
//! Field names follow the wire format expected by existing clients
//! (camelCase where the original API used it).

use serde::{Deserialize, Serialize};

use crate::code::Code;

/// Response to a successful file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub code: Code,
    pub filename: String,
    pub zipped: bool,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
}

/// Response to `GET /api/status/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatusResponse {
    pub downloaded: bool,
    pub expired: bool,
    pub filename: String,
}

/// Request body for `POST /api/text/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSendRequest {
    pub text: String,
}

/// Response to a successful text send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSendResponse {
    pub code: Code,
}

/// Response to `GET /api/text/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextGetResponse {
    pub text: String,
    pub viewed: bool,
}

/// Response to `GET /api/text/status/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStatusResponse {
    pub viewed: bool,
    pub expired: bool,
}

/// Response to `GET /api/text/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStatsResponse {
    #[serde(rename = "totalStored")]
    pub total_stored: usize,
    #[serde(rename = "maxCapacity")]
    pub max_capacity: usize,
    #[serde(rename = "utilizationPercent")]
    pub utilization_percent: f64,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
