//! API handlers for the simplify server
//!
//! Provides REST endpoints for:
//! - Document upload and analysis
//! - Service description
//! - Health checks

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared_types::{AnalysisReport, Document, DocumentFormat};
use simplify_core::CancelMode;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::AppState;

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

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
        service: "simplify-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Service description
#[derive(Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub accepted_formats: Vec<&'static str>,
    pub max_document_bytes: usize,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// Handler: GET /
pub async fn handle_index(State(state): State<AppState>) -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "simplify-server",
        version: env!("CARGO_PKG_VERSION"),
        accepted_formats: vec!["pdf", "docx"],
        max_document_bytes: state.pipeline.config().limits.max_document_bytes,
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/health",
                description: "Liveness check",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/upload",
                description: "Upload a PDF or DOCX as multipart field 'file' for analysis",
            },
        ],
    })
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub report: AnalysisReport,
}

/// Handler: POST /api/upload
///
/// Simplification stops after the configured analysis timeout. Chunks that
/// did not finish are reported as failed and the report comes back partial.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let (filename, bytes) = read_file_field(&mut multipart).await?;

    let document = Document::new(filename.clone(), bytes);
    if let DocumentFormat::Unsupported(ext) = document.format() {
        warn!(filename = %filename, "Rejected unsupported upload");
        let ext = if ext.is_empty() { "none" } else { ext.as_str() };
        return Err(ServerError::UnsupportedMediaType(ext.to_string()));
    }

    info!(filename = %filename, bytes = document.len(), "Analyzing upload");

    let report = state
        .pipeline
        .analyze_until(
            document,
            tokio::time::sleep(state.analysis_timeout),
            CancelMode::BestEffort,
        )
        .await?;

    info!(
        filename = %filename,
        clauses = report.clauses.len(),
        failed_chunks = report.status.failed_chunks().len(),
        "Analysis finished"
    );

    Ok(Json(UploadResponse {
        success: true,
        filename,
        report,
    }))
}

/// Pull the `file` field out of the form, skipping any other fields
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let raw_name = field.file_name().unwrap_or_default().to_string();
        if raw_name.trim().is_empty() {
            return Err(ServerError::InvalidRequest("No file selected".to_string()));
        }
        let filename = sanitize_filename(&raw_name)
            .ok_or_else(|| ServerError::InvalidRequest("Invalid filename".to_string()))?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(ServerError::InvalidRequest("Uploaded file is empty".to_string()));
        }
        return Ok((filename, bytes.to_vec()));
    }

    Err(ServerError::InvalidRequest(
        "No file part in the request".to_string(),
    ))
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(err.body_text())
    } else {
        ServerError::InvalidRequest(format!("Failed to read multipart: {}", err.body_text()))
    }
}

/// Reduce an uploaded filename to a safe base name.
///
/// Directory components are dropped, whitespace becomes `_`, and anything
/// outside `[A-Za-z0-9._-]` is removed. Returns `None` when nothing usable
/// is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
