//! Progress-callback trait for per-item merge events.
//!
//! Inject an [`Arc<dyn MergeProgressCallback>`] via
//! [`crate::config::MergeConfigBuilder::progress_callback`] to receive events
//! as the pipeline downloads and assembles each item.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfmerge::{MergeConfig, MergeProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl MergeProgressCallback for PageCounter {
//!     fn on_item_assembled(&self, index: usize, total_items: usize, pages: usize) {
//!         self.pages.fetch_add(pages, Ordering::SeqCst);
//!         eprintln!("item {}/{} added {} pages", index + 1, total_items, pages);
//!     }
//! }
//!
//! let config = MergeConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the merge pipeline as it processes each item.
///
/// `on_item_fetched` may be called concurrently and in completion order.
/// `on_item_assembled` and `on_item_degraded` are always called in input
/// order from the single assembly task. Item indices are 0-based.
pub trait MergeProgressCallback: Send + Sync {
    /// Called once, after mode filtering, before any network call.
    fn on_merge_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called when an item's bytes have been downloaded.
    fn on_item_fetched(&self, index: usize, total_items: usize, bytes: usize) {
        let _ = (index, total_items, bytes);
    }

    /// Called after an item's pages were appended to the output document.
    fn on_item_assembled(&self, index: usize, total_items: usize, pages: usize) {
        let _ = (index, total_items, pages);
    }

    /// Called when an image item fell back to a placeholder page.
    ///
    /// `on_item_assembled` still follows for the same item.
    fn on_item_degraded(&self, index: usize, total_items: usize, reason: &str) {
        let _ = (index, total_items, reason);
    }

    /// Called once the merged document has been serialised.
    fn on_merge_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl MergeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::MergeConfig`].
pub type ProgressCallback = Arc<dyn MergeProgressCallback>;
