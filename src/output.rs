//! Result types returned by a merge.

use crate::error::RenderIssue;
use crate::pipeline::classify::SourceKind;
use serde::{Deserialize, Serialize};

/// The merged document plus a per-item report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeOutput {
    /// Serialised PDF bytes, ready to be written or sent.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// One report per merged URL, in input order.
    pub items: Vec<ItemReport>,
    pub stats: MergeStats,
}

/// What one input URL contributed to the merged document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    /// 0-based position in the (mode-filtered) input list.
    pub index: usize,
    pub url: String,
    pub kind: SourceKind,
    pub mime_type: Option<String>,
    /// Downloaded size.
    pub bytes: usize,
    /// Pages appended for this item. Always 1 for images.
    pub pages: usize,
    /// Set when an image item was replaced by an error placeholder page.
    pub placeholder: Option<RenderIssue>,
}

/// Aggregate counters and timings for one merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeStats {
    pub total_pages: usize,
    pub pdf_items: usize,
    pub image_items: usize,
    pub placeholder_pages: usize,
    pub output_bytes: usize,
    pub download_duration_ms: u64,
    pub assembly_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl MergeOutput {
    /// Number of pages in the merged document.
    pub fn page_count(&self) -> usize {
        self.stats.total_pages
    }

    /// Consume the output, keeping only the PDF bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
