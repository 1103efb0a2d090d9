//! Error types for the edgequake-pdfmerge library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`MergeError`] is **fatal**: the merge cannot produce a document at all
//!   (no URLs, a download failed, a source PDF is unreadable). Returned as
//!   `Err(MergeError)` from the top-level `merge*` functions. No partial
//!   document is ever returned alongside it.
//!
//! * [`RenderIssue`] is **non-fatal**: a single image could not be re-encoded
//!   or embedded. The item still occupies exactly one page (an error
//!   placeholder) and the issue is recorded in
//!   [`crate::output::ItemReport::placeholder`].

use crate::config::MergeMode;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfmerge library.
///
/// Image-level failures use [`RenderIssue`] and never surface here.
#[derive(Debug, Error)]
pub enum MergeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller supplied an empty URL list.
    #[error("No URLs provided")]
    EmptyInput,

    /// The mode filter removed every URL.
    #[error("No URLs match mode '{mode}'\nCheck the URL extensions or use --mode mixed.")]
    NoMatchingUrls { mode: MergeMode },

    /// One or more URLs failed validation on the validated PDF path.
    #[error("Invalid URLs: {}", urls.join(", "))]
    InvalidUrls { urls: Vec<String> },

    // ── Download errors ───────────────────────────────────────────────────
    /// Connection failure or non-success HTTP status.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// A PDF-classified item could not be parsed (corrupt, encrypted, or not a PDF).
    #[error("Source '{url}' is not a readable PDF: {detail}")]
    MalformedPdf { url: String, detail: String },

    /// The merged document could not be serialised.
    #[error("Failed to serialise merged PDF: {0}")]
    SerializeFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why an image item was rendered as a placeholder page instead of the image.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum RenderIssue {
    /// The image could not be decoded for re-encoding to JPEG.
    #[error("re-encode to JPEG failed: {0}")]
    Reencode(String),

    /// PNG data could not be decoded into pixels.
    #[error("PNG decode failed: {0}")]
    Decode(String),

    /// JPEG data has no readable frame header.
    #[error("JPEG header unreadable: {0}")]
    Jpeg(String),

    /// The image has a degenerate size or the page could not be built.
    #[error("page layout failed: {0}")]
    Layout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_urls_lists_every_url() {
        let e = MergeError::InvalidUrls {
            urls: vec!["not a url".into(), "https://x/doc.txt".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("not a url, https://x/doc.txt"), "got: {msg}");
    }

    #[test]
    fn no_matching_urls_names_mode() {
        let e = MergeError::NoMatchingUrls {
            mode: MergeMode::ImagesOnly,
        };
        assert!(e.to_string().contains("images-only"));
    }

    #[test]
    fn download_timeout_display() {
        let e = MergeError::DownloadTimeout {
            url: "https://x/a.pdf".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("https://x/a.pdf"));
    }

    #[test]
    fn render_issue_round_trips_through_json() {
        let issue = RenderIssue::Jpeg("no SOF marker".into());
        let json = serde_json::to_string(&issue).unwrap();
        let back: RenderIssue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, issue);
    }
}
