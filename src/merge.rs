//! Merge entry points.
//!
//! ## Three stages, two kinds of concurrency
//!
//! Classification and download fan out across every URL at once; nothing in
//! them touches the output document. Assembly is the opposite: one task, one
//! `OutputDocument`, items appended strictly in input order. It runs inside
//! `spawn_blocking` because page copying, image decoding and compression are
//! CPU-bound and must not stall the async runtime.
//!
//! ## Failure policy
//!
//! A failed download or an unparseable PDF aborts the merge and no bytes are
//! returned. A bad image never does; it becomes a placeholder page and is
//! reported in [`ItemReport::placeholder`].

use crate::config::{MergeConfig, MergeMode};
use crate::error::MergeError;
use crate::output::{ItemReport, MergeOutput, MergeStats};
use crate::pipeline::append::append_pdf;
use crate::pipeline::classify::{classify_all, SourceItem, SourceKind};
use crate::pipeline::document::OutputDocument;
use crate::pipeline::fetch::{fetch_all, FetchedItem, HttpSource, RemoteSource};
use crate::pipeline::render::{append_image_page, ImagePage};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Merge PDFs and images from `urls` into one PDF, in input order.
///
/// `mode` first filters the list (see [`MergeMode::accepts`]). Every remaining
/// URL is classified, all are downloaded concurrently, and each is appended:
/// all pages of a PDF, or one page per image.
///
/// # Errors
/// - [`MergeError::EmptyInput`] when `urls` is empty (before any network call)
/// - [`MergeError::NoMatchingUrls`] when the mode filter removes every URL
/// - [`MergeError::DownloadFailed`] / [`MergeError::DownloadTimeout`] when any download fails
/// - [`MergeError::MalformedPdf`] when an item classified as PDF cannot be parsed
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfmerge::{merge, MergeConfig, MergeMode};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let urls = vec![
///     "https://example.com/cover.png".to_string(),
///     "https://example.com/report.pdf".to_string(),
/// ];
/// let output = merge(&urls, MergeMode::Mixed, &MergeConfig::default()).await?;
/// std::fs::write("merged.pdf", &output.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn merge(
    urls: &[String],
    mode: MergeMode,
    config: &MergeConfig,
) -> Result<MergeOutput, MergeError> {
    let total_start = Instant::now();
    let selected = filter_urls(urls, mode)?;
    info!(
        "Starting merge: {} of {} URLs selected ({} mode)",
        selected.len(),
        urls.len(),
        mode
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_merge_start(selected.len());
    }

    let source = resolve_source(config)?;

    info!("Classifying {} URLs", selected.len());
    let items = classify_all(&selected, source.as_ref(), config.probe_timeout_secs).await;
    for (i, item) in items.iter().enumerate() {
        debug!("Item {}: {:?} {}", i + 1, item.kind, item.url);
    }

    run(items, source.as_ref(), config, total_start).await
}

/// Merge PDFs only. Every URL is treated as a PDF; no classification probe is sent.
pub async fn merge_pdf_urls(
    urls: &[String],
    config: &MergeConfig,
) -> Result<MergeOutput, MergeError> {
    let total_start = Instant::now();
    if urls.is_empty() {
        return Err(MergeError::EmptyInput);
    }
    info!("Starting PDF merge: {} URLs", urls.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_merge_start(urls.len());
    }

    let source = resolve_source(config)?;
    let items = urls.iter().map(SourceItem::pdf).collect();
    run(items, source.as_ref(), config, total_start).await
}

/// Merge exactly two PDFs, `first` then `second`.
pub async fn merge_two_pdf_urls(
    first: &str,
    second: &str,
    config: &MergeConfig,
) -> Result<MergeOutput, MergeError> {
    merge_pdf_urls(&[first.to_string(), second.to_string()], config).await
}

/// Check that every URL parses and looks like a PDF reference.
///
/// A URL passes when it is absolute and either ends with `.pdf` in any case
/// or contains a lowercase `pdf` anywhere. All rejected URLs are reported
/// together.
pub fn validate_pdf_urls(urls: &[String]) -> Result<(), MergeError> {
    let invalid: Vec<String> = urls
        .iter()
        .filter(|url| !is_valid_pdf_url(url))
        .cloned()
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(MergeError::InvalidUrls { urls: invalid })
    }
}

fn is_valid_pdf_url(url: &str) -> bool {
    if reqwest::Url::parse(url).is_err() {
        return false;
    }
    // Only the suffix check ignores case; `PDF` elsewhere in the URL does not count.
    url.to_lowercase().ends_with(".pdf") || url.contains("pdf")
}

/// [`validate_pdf_urls`] followed by [`merge_pdf_urls`].
pub async fn merge_validated_pdf_urls(
    urls: &[String],
    config: &MergeConfig,
) -> Result<MergeOutput, MergeError> {
    validate_pdf_urls(urls)?;
    merge_pdf_urls(urls, config).await
}

/// Merge and write the result to `output_path`.
///
/// See [`write_pdf`] for how the file is written.
pub async fn merge_to_file(
    urls: &[String],
    mode: MergeMode,
    output_path: impl AsRef<Path>,
    config: &MergeConfig,
) -> Result<MergeStats, MergeError> {
    let output = merge(urls, mode, config).await?;
    write_pdf(output_path, output.bytes).await?;
    Ok(output.stats)
}

/// Write PDF bytes to `path`, creating parent directories.
///
/// The bytes go to a temp file next to the target which is then persisted
/// over it, so the path never holds a partial document.
pub async fn write_pdf(path: impl AsRef<Path>, bytes: Vec<u8>) -> Result<(), MergeError> {
    let path = path.as_ref().to_path_buf();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| MergeError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let len = bytes.len();
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_atomic(&parent, &target, &bytes))
        .await
        .map_err(|e| MergeError::Internal(format!("Write task panicked: {}", e)))??;

    info!("Wrote {} bytes to {}", len, path.display());
    Ok(())
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), MergeError> {
    use std::io::Write;

    let fail = |source: std::io::Error| MergeError::OutputWriteFailed {
        path: target.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.flush().map_err(fail)?;
    tmp.persist(target).map_err(|e| fail(e.error))?;
    Ok(())
}

/// Synchronous wrapper around [`merge`].
///
/// Creates a temporary tokio runtime internally.
pub fn merge_sync(
    urls: &[String],
    mode: MergeMode,
    config: &MergeConfig,
) -> Result<MergeOutput, MergeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MergeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(merge(urls, mode, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Apply the mode filter, rejecting empty input before anything else happens.
fn filter_urls(urls: &[String], mode: MergeMode) -> Result<Vec<String>, MergeError> {
    if urls.is_empty() {
        return Err(MergeError::EmptyInput);
    }
    let selected: Vec<String> = urls.iter().filter(|u| mode.accepts(u)).cloned().collect();
    if selected.is_empty() {
        return Err(MergeError::NoMatchingUrls { mode });
    }
    Ok(selected)
}

/// Injected source if any, else a fresh HTTP client.
fn resolve_source(config: &MergeConfig) -> Result<Arc<dyn RemoteSource>, MergeError> {
    if let Some(ref source) = config.source {
        return Ok(Arc::clone(source));
    }
    Ok(Arc::new(HttpSource::new(&config.user_agent)?))
}

/// Download, assemble and serialise already-classified items.
async fn run(
    items: Vec<SourceItem>,
    source: &dyn RemoteSource,
    config: &MergeConfig,
    total_start: Instant,
) -> Result<MergeOutput, MergeError> {
    let download_start = Instant::now();
    let fetched = fetch_all(items, source, config).await?;
    let download_duration_ms = download_start.elapsed().as_millis() as u64;
    info!(
        "Downloaded {} items ({} bytes) in {}ms",
        fetched.len(),
        fetched.iter().map(|f| f.bytes.len()).sum::<usize>(),
        download_duration_ms
    );

    info!("Assembling {} items", fetched.len());
    let assembly_start = Instant::now();
    let config_clone = config.clone();
    let (bytes, reports) = tokio::task::spawn_blocking(move || assemble(fetched, &config_clone))
        .await
        .map_err(|e| MergeError::Internal(format!("Assembly task panicked: {}", e)))??;
    let assembly_duration_ms = assembly_start.elapsed().as_millis() as u64;

    let stats = MergeStats {
        total_pages: reports.iter().map(|r| r.pages).sum(),
        pdf_items: reports.iter().filter(|r| r.kind == SourceKind::Pdf).count(),
        image_items: reports.iter().filter(|r| r.kind == SourceKind::Image).count(),
        placeholder_pages: reports.iter().filter(|r| r.placeholder.is_some()).count(),
        output_bytes: bytes.len(),
        download_duration_ms,
        assembly_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Merge complete: {} pages from {} items ({} placeholders), {}ms total",
        stats.total_pages,
        reports.len(),
        stats.placeholder_pages,
        stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_merge_complete(stats.total_pages);
    }

    Ok(MergeOutput {
        bytes,
        items: reports,
        stats,
    })
}

/// Append every item in order and serialise. Runs on a blocking thread.
fn assemble(
    fetched: Vec<FetchedItem>,
    config: &MergeConfig,
) -> Result<(Vec<u8>, Vec<ItemReport>), MergeError> {
    let total = fetched.len();
    let progress = config.progress_callback.as_ref();
    let mut out = OutputDocument::new();
    let mut reports = Vec::with_capacity(total);

    for item in fetched {
        let (pages, placeholder) = match item.kind {
            SourceKind::Pdf => (append_pdf(&mut out, &item.bytes, &item.url)?, None),
            SourceKind::Image => {
                match append_image_page(&mut out, &item.bytes, item.mime_type.as_deref(), config) {
                    ImagePage::Rendered { .. } => (1, None),
                    ImagePage::Placeholder { reason } => {
                        if let Some(cb) = progress {
                            cb.on_item_degraded(item.index, total, &reason.to_string());
                        }
                        (1, Some(reason))
                    }
                }
            }
        };
        debug!("Item {} contributed {} pages", item.index + 1, pages);
        if let Some(cb) = progress {
            cb.on_item_assembled(item.index, total, pages);
        }

        reports.push(ItemReport {
            index: item.index,
            bytes: item.bytes.len(),
            url: item.url,
            kind: item.kind,
            mime_type: item.mime_type,
            pages,
            placeholder,
        });
    }

    out.set_info(&config.metadata);
    let bytes = out.finish()?;
    Ok((bytes, reports))
}
