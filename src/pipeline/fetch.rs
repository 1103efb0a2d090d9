//! Download stage: retrieve raw bytes for every classified item.
//!
//! Network access goes through the [`RemoteSource`] trait so the rest of the
//! pipeline never touches HTTP details. [`HttpSource`] is the production
//! implementation; tests and embedding applications can inject their own via
//! [`crate::config::MergeConfigBuilder::source`].
//!
//! ## All-or-nothing join
//!
//! Every item is requested at once unless `max_concurrent_downloads` caps
//! the fan-out. `buffered` keeps results in input order and `try_collect` stops at the
//! first failure; the remaining in-flight downloads are dropped with the
//! stream and their results discarded.

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::pipeline::classify::{SourceItem, SourceKind};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};

/// The ability to probe and download remote files.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Issue a HEAD request and return the `Content-Type` header, if any.
    ///
    /// Errors are reported but the classifier treats them as "unknown".
    async fn probe_content_type(
        &self,
        url: &str,
        timeout_secs: u64,
    ) -> Result<Option<String>, MergeError>;

    /// Download the full body of `url`.
    ///
    /// Fails with [`MergeError::DownloadTimeout`] past `timeout_secs` and with
    /// [`MergeError::DownloadFailed`] on connection errors or non-2xx status.
    async fn fetch(&self, url: &str, timeout_secs: u64) -> Result<Vec<u8>, MergeError>;
}

/// A source item after its bytes were retrieved.
#[derive(Debug, Clone)]
pub struct FetchedItem {
    /// Position in the merged input list.
    pub index: usize,
    pub url: String,
    pub kind: SourceKind,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// [`RemoteSource`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Build a client that sends `user_agent` with every request.
    pub fn new(user_agent: &str) -> Result<Self, MergeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| MergeError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (connection pool, proxy settings, …).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn map_request_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> MergeError {
    if e.is_timeout() {
        MergeError::DownloadTimeout {
            url: url.to_string(),
            secs: timeout_secs,
        }
    } else {
        MergeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn probe_content_type(
        &self,
        url: &str,
        timeout_secs: u64,
    ) -> Result<Option<String>, MergeError> {
        let response = self
            .client
            .head(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| map_request_error(url, timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(MergeError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HEAD returned HTTP {}", response.status()),
            });
        }

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    async fn fetch(&self, url: &str, timeout_secs: u64) -> Result<Vec<u8>, MergeError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| map_request_error(url, timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(MergeError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_request_error(url, timeout_secs, e))?;
        Ok(bytes.to_vec())
    }
}

/// Download every item concurrently, preserving input order.
///
/// Returns the first error encountered; no partial result is produced.
pub async fn fetch_all(
    items: Vec<SourceItem>,
    source: &dyn RemoteSource,
    config: &MergeConfig,
) -> Result<Vec<FetchedItem>, MergeError> {
    let total = items.len();
    let timeout_secs = config.download_timeout_secs;
    let progress = config.progress_callback.as_ref();
    info!("Downloading {} items", total);

    stream::iter(items.into_iter().enumerate().map(|(index, item)| async move {
        debug!("Downloading item {}: {}", index + 1, item.url);
        let bytes = source.fetch(&item.url, timeout_secs).await?;
        debug!("Item {} downloaded: {} bytes", index + 1, bytes.len());
        if let Some(cb) = progress {
            cb.on_item_fetched(index, total, bytes.len());
        }
        Ok::<_, MergeError>(FetchedItem {
            index,
            url: item.url,
            kind: item.kind,
            mime_type: item.mime_type,
            bytes,
        })
    }))
    .buffered(config.max_concurrent_downloads.min(total).max(1))
    .try_collect()
    .await
}
