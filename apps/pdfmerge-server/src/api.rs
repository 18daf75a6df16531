//! API handlers for the PDF merge server
//!
//! - `GET /health`: liveness
//! - `POST /api/merge`: multipart upload in, merged PDF attachment out

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pdfmerge_core::{format_file_size, FormPart};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

pub const MERGED_FILE_NAME: &str = "merged.pdf";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfmerge-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /api/merge
///
/// Files are merged in the order their parts appear in the form body.
pub async fn handle_merge(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let multipart = multipart.map_err(|e| ServerError::InvalidUpload(e.body_text()))?;
    let parts = read_form_parts(multipart).await?;

    let files = state.config.upload_policy().collect(parts)?;

    info!("Merge request: {} files", files.len());
    for (index, file) in files.iter().enumerate() {
        debug!(
            "File {}: name='{}', content_type={:?}, size={}",
            index,
            file.file_name,
            file.content_type,
            format_file_size(file.data.len() as u64)
        );
    }

    // Parsing and serializing are CPU-bound; keep them off the reactor
    let merger = state.config.merger();
    let payloads: Vec<Vec<u8>> = files.into_iter().map(|file| file.data).collect();
    let output = tokio::task::spawn_blocking(move || merger.merge(&payloads))
        .await
        .map_err(|e| ServerError::Internal(format!("Merge task failed: {}", e)))??;

    let stats = &output.statistics;
    info!(
        "Merged {} files into {} pages ({} -> {}) in {}ms",
        stats.files_merged,
        stats.total_pages,
        format_file_size(stats.input_size_bytes as u64),
        format_file_size(stats.output_size_bytes as u64),
        stats.elapsed.as_millis()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", MERGED_FILE_NAME),
            ),
        ],
        output.bytes,
    )
        .into_response())
}

/// Read every multipart field into memory, preserving body order
pub async fn read_form_parts(mut multipart: Multipart) -> Result<Vec<FormPart>, ServerError> {
    let mut parts = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::InvalidUpload(e.body_text())
        }
    })? {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ServerError::PayloadTooLarge
            } else {
                ServerError::InvalidUpload(e.body_text())
            }
        })?;

        debug!(
            "Received field: name='{}', filename={:?}, content_type={:?}",
            name, file_name, content_type
        );

        parts.push(FormPart {
            name,
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    Ok(parts)
}
