//! Request and response bodies

use serde::{Deserialize, Serialize};

pub const MISSING_URL_MESSAGE: &str = "Please provide a YouTube URL in the request body";
pub const INVALID_URL_MESSAGE: &str = "Invalid YouTube URL";
pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to get transcript. The video might not have auto-generated captions.";

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptRequest {
    pub url: String,
}

/// Body of 400 responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of 503 responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl FailureResponse {
    pub fn extraction_failed() -> Self {
        Self {
            success: false,
            error: EXTRACTION_FAILED_MESSAGE.to_string(),
        }
    }
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
