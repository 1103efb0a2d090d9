use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfmerge::{HttpSource, MergeConfig, DEFAULT_USER_AGENT};
use pdfmerge_server::{router, AppState};
use tracing_subscriber::EnvFilter;

/// HTTP server merging remote PDFs and images into one PDF.
#[derive(Parser, Debug)]
#[command(name = "pdfmerge-server", version)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "PDFMERGE_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Per-download timeout in seconds.
    #[arg(long, env = "PDFMERGE_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Timeout for the HEAD probe on URLs without a known extension.
    #[arg(long, env = "PDFMERGE_PROBE_TIMEOUT", default_value_t = 10)]
    probe_timeout: u64,

    /// Emit logs as JSON lines.
    #[arg(long, env = "PDFMERGE_LOG_JSON")]
    log_json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFMERGE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    if cli.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // One client for every request, so connections are pooled.
    let source = HttpSource::new(DEFAULT_USER_AGENT).context("Failed to build HTTP client")?;
    let config = MergeConfig::builder()
        .download_timeout_secs(cli.download_timeout)
        .probe_timeout_secs(cli.probe_timeout)
        .source(Arc::new(source))
        .build()
        .context("Invalid configuration")?;

    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    tracing::info!(addr = %cli.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
