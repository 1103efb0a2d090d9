//! Content-type classification: decide whether a URL is a PDF or an image.
//!
//! The extension check is free and covers most real inputs. Only URLs with
//! no recognised suffix (query-string URLs, CDN handles) cost a HEAD probe.
//! Classification never fails: anything still ambiguous after the probe is
//! treated as a PDF, and a wrong guess surfaces later as a malformed-PDF
//! error or a placeholder page for that single item.

use crate::pipeline::fetch::RemoteSource;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Image extensions accepted by the classifier, with their MIME types.
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (".gif", "image/gif"),
    (".bmp", "image/bmp"),
    (".webp", "image/webp"),
    (".tiff", "image/tiff"),
    (".tif", "image/tiff"),
];

/// MIME type assumed for images whose extension is not in the table.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// The two kinds of source the merge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Image,
}

/// One input URL with its best-effort kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub url: String,
    pub kind: SourceKind,
    /// Only set for images.
    pub mime_type: Option<String>,
}

impl SourceItem {
    pub fn pdf(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: SourceKind::Pdf,
            mime_type: None,
        }
    }

    pub fn image(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: SourceKind::Image,
            mime_type: Some(mime_type.into()),
        }
    }
}

/// Return the matching image extension of an already-lowercased URL.
pub fn image_extension(lower_url: &str) -> Option<&'static str> {
    IMAGE_EXTENSIONS
        .iter()
        .find(|(ext, _)| lower_url.ends_with(ext))
        .map(|(ext, _)| *ext)
}

/// Look up the MIME type for an image extension (with leading dot).
pub fn mime_for_extension(ext: &str) -> &'static str {
    IMAGE_EXTENSIONS
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_IMAGE_MIME)
}

/// Classify by suffix alone. `None` means the suffix is not conclusive.
pub fn classify_by_extension(url: &str) -> Option<SourceItem> {
    let lower = url.to_lowercase();
    if lower.ends_with(".pdf") {
        return Some(SourceItem::pdf(url));
    }
    image_extension(&lower).map(|ext| SourceItem::image(url, mime_for_extension(ext)))
}

/// Interpret a `Content-Type` header value. Parameters (`; charset=…`) are dropped.
pub fn classify_content_type(url: &str, content_type: &str) -> Option<SourceItem> {
    let lower = content_type.to_lowercase();
    let essence = lower.split(';').next().unwrap_or("").trim();
    if essence.contains("pdf") {
        Some(SourceItem::pdf(url))
    } else if essence.starts_with("image/") {
        Some(SourceItem::image(url, essence))
    } else {
        None
    }
}

/// Classify one URL: extension first, then a HEAD probe, then PDF by default.
pub async fn classify(url: &str, source: &dyn RemoteSource, probe_timeout_secs: u64) -> SourceItem {
    if let Some(item) = classify_by_extension(url) {
        return item;
    }

    match source.probe_content_type(url, probe_timeout_secs).await {
        Ok(Some(content_type)) => {
            if let Some(item) = classify_content_type(url, &content_type) {
                debug!("Probed {} → {:?} ({})", url, item.kind, content_type);
                return item;
            }
            warn!(
                "Unrecognised content type '{}' for {}, assuming PDF",
                content_type, url
            );
        }
        Ok(None) => warn!("No content type for {}, assuming PDF", url),
        Err(e) => warn!("Could not detect content type for {}, assuming PDF: {}", url, e),
    }

    SourceItem::pdf(url)
}

/// Classify every URL concurrently. Output order matches input order.
pub async fn classify_all(
    urls: &[String],
    source: &dyn RemoteSource,
    probe_timeout_secs: u64,
) -> Vec<SourceItem> {
    join_all(
        urls.iter()
            .map(|url| classify(url, source, probe_timeout_secs)),
    )
    .await
}
