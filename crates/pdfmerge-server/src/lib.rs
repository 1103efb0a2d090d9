//! HTTP front end for edgequake-pdfmerge.
//!
//! ```text
//! POST /merge-urls/multiple   validated PDF-only merge
//! POST /merge-urls/two        two PDFs
//! GET  /merge-urls/help
//! POST /merge-mixed/all       PDFs and images, optional `type` filter
//! GET  /merge-mixed/help
//! GET  /health
//! ```
//!
//! Successful merges answer with the PDF as an attachment. Merge failures
//! answer 500 with `{"success": false, "message": ...}`.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // PDF-only merges
        .route("/merge-urls/multiple", post(routes::pdf_merge::merge_multiple))
        .route("/merge-urls/two", post(routes::pdf_merge::merge_two))
        .route("/merge-urls/help", get(routes::help::pdf_merge_help))
        // Mixed content
        .route("/merge-mixed/all", post(routes::mixed_merge::merge_all))
        .route("/merge-mixed/help", get(routes::help::mixed_merge_help))
        .layer(axum_mw::from_fn(middleware::request_log))
        .layer(cors)
        .with_state(state)
}
