use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use edgequake_pdfmerge::{merge_two_pdf_urls, merge_validated_pdf_urls};

use crate::error::ApiError;
use crate::routes::pdf_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MergeUrlsRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    pub filename: Option<String>,
}

#[derive(Deserialize)]
pub struct MergeTwoUrlsRequest {
    #[serde(default)]
    pub url1: String,
    #[serde(default)]
    pub url2: String,
    pub filename: Option<String>,
}

/// Merge a list of PDF URLs after checking each one looks like a PDF.
pub async fn merge_multiple(
    State(state): State<AppState>,
    payload: Result<Json<MergeUrlsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let output = merge_validated_pdf_urls(&req.urls, &state.config).await?;
    Ok(pdf_response(output.bytes, req.filename.as_deref()))
}

/// Merge exactly two PDF URLs.
pub async fn merge_two(
    State(state): State<AppState>,
    payload: Result<Json<MergeTwoUrlsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let output = merge_two_pdf_urls(&req.url1, &req.url2, &state.config).await?;
    Ok(pdf_response(output.bytes, req.filename.as_deref()))
}
