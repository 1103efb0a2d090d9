//! Configuration types for URL-to-PDF merging.
//!
//! All merge behaviour is controlled through [`MergeConfig`], built via its
//! [`MergeConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share one config across concurrent requests (the server holds a single
//! `Arc<MergeConfig>`) and to inject test doubles for the network.

use crate::error::MergeError;
use crate::pipeline::classify::image_extension;
use crate::pipeline::fetch::RemoteSource;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// `User-Agent` sent with every probe and download.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; PDF-Merger/1.0)";

/// Configuration for a merge.
///
/// Built via [`MergeConfig::builder()`] or using [`MergeConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfmerge::MergeConfig;
///
/// let config = MergeConfig::builder()
///     .download_timeout_secs(60)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct MergeConfig {
    /// Per-download timeout in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Timeout for the HEAD probe used when a URL has no recognised
    /// extension. Default: 10.
    pub probe_timeout_secs: u64,

    /// `User-Agent` header for every request. Default: [`DEFAULT_USER_AGENT`].
    pub user_agent: String,

    /// Upper bound on in-flight downloads for one merge.
    /// Default: `usize::MAX`, i.e. every download starts at once.
    pub max_concurrent_downloads: usize,

    /// JPEG quality used when re-encoding GIF/BMP/WebP/TIFF images. Default: 90.
    pub jpeg_quality: u8,

    /// Blank border around each image page, in points. Default: 20.
    pub page_margin: f32,

    /// Page size used to cap image pages and for placeholder pages.
    /// Default: [`PageSize::LEGAL`].
    pub reference_page: PageSize,

    /// Info dictionary written to the merged document.
    pub metadata: DocumentInfo,

    /// Pre-constructed remote source. If None, an [`crate::pipeline::fetch::HttpSource`]
    /// is built from `user_agent` for each merge.
    pub source: Option<Arc<dyn RemoteSource>>,

    /// Optional per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: 30,
            probe_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent_downloads: usize::MAX,
            jpeg_quality: 90,
            page_margin: 20.0,
            reference_page: PageSize::LEGAL,
            metadata: DocumentInfo::default(),
            source: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for MergeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeConfig")
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_downloads", &self.max_concurrent_downloads)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("page_margin", &self.page_margin)
            .field("reference_page", &self.reference_page)
            .field("metadata", &self.metadata)
            .field("source", &self.source.as_ref().map(|_| "<dyn RemoteSource>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn MergeProgressCallback>"),
            )
            .finish()
    }
}

impl MergeConfig {
    /// Create a new builder for `MergeConfig`.
    pub fn builder() -> MergeConfigBuilder {
        MergeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`MergeConfig`].
#[derive(Debug)]
pub struct MergeConfigBuilder {
    config: MergeConfig,
}

impl MergeConfigBuilder {
    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.config.probe_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn max_concurrent_downloads(mut self, n: usize) -> Self {
        self.config.max_concurrent_downloads = n.max(1);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn page_margin(mut self, points: f32) -> Self {
        self.config.page_margin = points;
        self
    }

    pub fn reference_page(mut self, size: PageSize) -> Self {
        self.config.reference_page = size;
        self
    }

    pub fn metadata(mut self, info: DocumentInfo) -> Self {
        self.config.metadata = info;
        self
    }

    pub fn source(mut self, source: Arc<dyn RemoteSource>) -> Self {
        self.config.source = Some(source);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<MergeConfig, MergeError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 || c.probe_timeout_secs == 0 {
            return Err(MergeError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if !c.page_margin.is_finite() || c.page_margin < 0.0 {
            return Err(MergeError::InvalidConfig(format!(
                "Page margin must be a non-negative number, got {}",
                c.page_margin
            )));
        }
        let (usable_w, usable_h) = c.reference_page.usable_area(c.page_margin);
        if usable_w <= 0.0 || usable_h <= 0.0 {
            return Err(MergeError::InvalidConfig(format!(
                "Margin {}pt leaves no usable area on a {}×{}pt page",
                c.page_margin, c.reference_page.width, c.reference_page.height
            )));
        }
        if c.user_agent.trim().is_empty() {
            return Err(MergeError::InvalidConfig("User-Agent must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// Which URLs of the input list take part in the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Every URL, PDFs and images interleaved. (default)
    #[default]
    Mixed,
    /// Only URLs ending in `.pdf` or containing `pdf`.
    PdfOnly,
    /// Only URLs with an image extension or containing `image`.
    ImagesOnly,
}

impl MergeMode {
    /// Whether `url` survives this mode's filter.
    ///
    /// Matching is lenient: `pdf-only` accepts any URL whose lowercase form
    /// contains `pdf` anywhere, e.g. `https://host/pdfviewer?id=1`.
    pub fn accepts(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        match self {
            MergeMode::Mixed => true,
            MergeMode::PdfOnly => lower.ends_with(".pdf") || lower.contains("pdf"),
            MergeMode::ImagesOnly => image_extension(&lower).is_some() || lower.contains("image"),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeMode::Mixed => "mixed",
            MergeMode::PdfOnly => "pdf-only",
            MergeMode::ImagesOnly => "images-only",
        })
    }
}

impl FromStr for MergeMode {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mixed" => Ok(MergeMode::Mixed),
            "pdf-only" => Ok(MergeMode::PdfOnly),
            "images-only" => Ok(MergeMode::ImagesOnly),
            other => Err(MergeError::InvalidConfig(format!(
                "Unknown merge mode '{other}' (expected mixed, pdf-only or images-only)"
            ))),
        }
    }
}

/// A page size in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Legal, 8.5 × 14 in.
    pub const LEGAL: PageSize = PageSize {
        width: 612.0,
        height: 1008.0,
    };

    /// US Letter, 8.5 × 11 in.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    /// ISO A4.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// Area left for content after removing `margin` on every side.
    pub fn usable_area(&self, margin: f32) -> (f32, f32) {
        (self.width - 2.0 * margin, self.height - 2.0 * margin)
    }
}

/// Fixed Info-dictionary entries for the merged document.
///
/// No creation or modification date is written, so merging identical
/// inputs twice yields identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub creator: String,
    pub producer: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "Merged PDF Document".to_string(),
            creator: "Mixed Content Merger".to_string(),
            producer: concat!("edgequake-pdfmerge ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = MergeConfig::default();
        assert_eq!(c.download_timeout_secs, 30);
        assert_eq!(c.probe_timeout_secs, 10);
        assert_eq!(c.jpeg_quality, 90);
        assert_eq!(c.page_margin, 20.0);
        assert_eq!(c.reference_page, PageSize::LEGAL);
        assert_eq!(c.metadata.title, "Merged PDF Document");
        assert_eq!(c.max_concurrent_downloads, usize::MAX);
    }

    #[test]
    fn builder_clamps_quality() {
        let c = MergeConfig::builder().jpeg_quality(0).build().unwrap();
        assert_eq!(c.jpeg_quality, 1);
        let c = MergeConfig::builder().jpeg_quality(255).build().unwrap();
        assert_eq!(c.jpeg_quality, 100);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(MergeConfig::builder().download_timeout_secs(0).build().is_err());
        assert!(MergeConfig::builder().probe_timeout_secs(0).build().is_err());
    }

    #[test]
    fn builder_rejects_margin_that_swallows_page() {
        let err = MergeConfig::builder()
            .reference_page(PageSize::LETTER)
            .page_margin(400.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("usable area"), "got: {err}");
    }

    #[test]
    fn mode_parses_and_displays() {
        for mode in [MergeMode::Mixed, MergeMode::PdfOnly, MergeMode::ImagesOnly] {
            assert_eq!(mode.to_string().parse::<MergeMode>().unwrap(), mode);
        }
        assert_eq!(" PDF-Only ".parse::<MergeMode>().unwrap(), MergeMode::PdfOnly);
        assert!("pdf".parse::<MergeMode>().is_err());
    }

    #[test]
    fn mode_serde_uses_kebab_case() {
        let m: MergeMode = serde_json::from_str("\"images-only\"").unwrap();
        assert_eq!(m, MergeMode::ImagesOnly);
        assert_eq!(serde_json::to_string(&MergeMode::PdfOnly).unwrap(), "\"pdf-only\"");
    }

    #[test]
    fn pdf_only_filter_is_lenient() {
        let m = MergeMode::PdfOnly;
        assert!(m.accepts("https://x/a.PDF"));
        assert!(m.accepts("https://x/pdfviewer?id=1"));
        assert!(!m.accepts("https://x/b.jpg"));
    }

    #[test]
    fn images_only_filter() {
        let m = MergeMode::ImagesOnly;
        assert!(m.accepts("https://x/b.jpg"));
        assert!(m.accepts("https://x/scan.TIF"));
        assert!(m.accepts("https://cdn/image?id=4"));
        assert!(!m.accepts("https://x/a.pdf"));
    }

    #[test]
    fn usable_area_subtracts_both_sides() {
        assert_eq!(PageSize::LEGAL.usable_area(20.0), (572.0, 968.0));
    }
}
