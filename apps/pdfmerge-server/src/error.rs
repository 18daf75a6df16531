//! Error types for the PDF merge server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfmerge_core::MergeError;
use serde::Serialize;
use thiserror::Error;

/// Message returned for every merge failure; details stay in the logs.
pub const MERGE_FAILED_MESSAGE: &str = "Failed to merge PDFs.";

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Too few files, or anything else wrong with what was submitted
    #[error("{0}")]
    Validation(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("Merge failed: {0}")]
    Merge(#[source] MergeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MergeError> for ServerError {
    fn from(err: MergeError) -> Self {
        if err.is_validation() {
            ServerError::Validation(err.to_string())
        } else {
            ServerError::Merge(err)
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            ServerError::InvalidUpload(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_UPLOAD",
                format!("Failed to read upload: {}", msg),
            ),
            ServerError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Upload exceeds the size limit".to_string(),
            ),
            ServerError::Merge(err) => {
                tracing::error!("Merge error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MERGE_FAILED",
                    MERGE_FAILED_MESSAGE.to_string(),
                )
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MERGE_FAILED",
                    MERGE_FAILED_MESSAGE.to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
