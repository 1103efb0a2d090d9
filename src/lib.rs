//! # edgequake-pdfmerge
//!
//! Merge remote PDFs and images, given as an ordered list of URLs, into one
//! PDF document.
//!
//! Every source PDF contributes all of its pages; every image becomes one
//! page sized to the image. Output page order always follows input order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URLs
//!  │
//!  ├─ 1. Filter    mixed / pdf-only / images-only
//!  ├─ 2. Classify  extension, else HEAD Content-Type, else PDF
//!  ├─ 3. Fetch     concurrent GETs; first failure aborts
//!  ├─ 4. Assemble  copy PDF pages / place images (spawn_blocking, in order)
//!  └─ 5. Output    serialised PDF + per-item report
//! ```
//!
//! A corrupt image never aborts a merge: it is replaced by a placeholder page
//! and reported in [`ItemReport::placeholder`]. A failed download or an
//! unreadable PDF aborts it with a [`MergeError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfmerge::{merge, MergeConfig, MergeMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let urls = vec![
//!         "https://example.com/scan.png".to_string(),
//!         "https://example.com/contract.pdf".to_string(),
//!     ];
//!     let output = merge(&urls, MergeMode::Mixed, &MergeConfig::default()).await?;
//!     std::fs::write("merged.pdf", &output.bytes)?;
//!     eprintln!("{} pages, {} placeholders",
//!         output.stats.total_pages,
//!         output.stats.placeholder_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfmerge` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-pdfmerge = { version = "0.1", default-features = false }
//! ```
//!
//! ## Supported Sources
//!
//! | Kind | Extensions | Embedded as |
//! |------|------------|-------------|
//! | PDF | `.pdf` | all pages copied |
//! | JPEG | `.jpg`, `.jpeg` | verbatim (`DCTDecode`) |
//! | PNG | `.png` | raw samples + alpha mask |
//! | Other raster | `.gif`, `.bmp`, `.webp`, `.tiff`, `.tif` | re-encoded to JPEG |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    DocumentInfo, MergeConfig, MergeConfigBuilder, MergeMode, PageSize, DEFAULT_USER_AGENT,
};
pub use error::{MergeError, RenderIssue};
pub use merge::{
    merge, merge_pdf_urls, merge_sync, merge_to_file, merge_two_pdf_urls,
    merge_validated_pdf_urls, validate_pdf_urls, write_pdf,
};
pub use output::{ItemReport, MergeOutput, MergeStats};
pub use pipeline::classify::SourceKind;
pub use pipeline::fetch::{HttpSource, RemoteSource};
pub use progress::{MergeProgressCallback, NoopProgressCallback, ProgressCallback};
