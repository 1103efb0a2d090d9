use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use edgequake_pdfmerge::{merge, MergeMode};

use crate::error::ApiError;
use crate::routes::pdf_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MixedMergeRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    pub filename: Option<String>,
    /// `mixed`, `pdf-only` or `images-only`.
    #[serde(rename = "type")]
    pub merge_type: Option<String>,
}

/// Unknown or missing types fall back to mixed.
pub fn parse_mode(merge_type: Option<&str>) -> MergeMode {
    match merge_type {
        None => MergeMode::Mixed,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(merge_type = raw, "unknown merge type, using mixed");
            MergeMode::Mixed
        }),
    }
}

/// Merge PDFs and images into one PDF.
pub async fn merge_all(
    State(state): State<AppState>,
    payload: Result<Json<MixedMergeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let mode = parse_mode(req.merge_type.as_deref());
    let output = merge(&req.urls, mode, &state.config).await?;
    Ok(pdf_response(output.bytes, req.filename.as_deref()))
}
