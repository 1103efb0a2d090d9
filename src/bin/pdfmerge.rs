//! CLI binary for edgequake-pdfmerge.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `MergeConfig` and writes the merged PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfmerge::{
    merge, merge_validated_pdf_urls, write_pdf, MergeConfig, MergeMode, MergeOutput,
    MergeProgressCallback, PageSize, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar advanced twice per item, once when its bytes
/// arrive and once when its pages are appended.
struct CliProgressCallback {
    bar: ProgressBar,
    degraded: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Classifying URLs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            degraded: AtomicUsize::new(0),
        })
    }

    /// Remove the bar from the terminal unless it already finished.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl MergeProgressCallback for CliProgressCallback {
    fn on_merge_start(&self, total_items: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} steps  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(2 * total_items as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Merging");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Merging {total_items} URLs…"))
        ));
    }

    fn on_item_fetched(&self, index: usize, total_items: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {}",
            dim("↓"),
            index + 1,
            total_items,
            dim(&format!("{bytes:>9} bytes")),
        ));
        self.bar.inc(1);
    }

    fn on_item_assembled(&self, index: usize, total_items: usize, pages: usize) {
        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total_items,
            dim(&format!("{pages} pages")),
        ));
        self.bar.inc(1);
    }

    fn on_item_degraded(&self, index: usize, total_items: usize, reason: &str) {
        self.degraded.fetch_add(1, Ordering::SeqCst);
        let msg = if reason.chars().count() > 80 {
            format!("{}\u{2026}", reason.chars().take(79).collect::<String>())
        } else {
            reason.to_string()
        };
        self.bar.println(format!(
            "  {} Item {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total_items,
            red(&msg),
        ));
    }

    fn on_merge_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        let degraded = self.degraded.load(Ordering::SeqCst);
        if degraded == 0 {
            eprintln!("{} {} pages merged", green("✔"), bold(&total_pages.to_string()));
        } else {
            eprintln!(
                "{} {} pages merged  ({} image placeholders)",
                cyan("⚠"),
                bold(&total_pages.to_string()),
                red(&degraded.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge PDFs and images, in order
  pdfmerge https://example.com/cover.png https://example.com/report.pdf -o report.pdf

  # Only keep the PDFs of a mixed list
  pdfmerge --mode pdf-only a.pdf b.jpg c.pdf

  # Reject anything that does not look like a PDF URL
  pdfmerge --validate-pdf https://example.com/a.pdf https://example.com/b.pdf

  # Print the per-item report as JSON
  pdfmerge --json https://example.com/a.pdf https://example.com/b.png > report.json

SOURCES:
  Kind        Extensions                     Page
  ─────────   ─────────────────────────────  ───────────────────────────
  PDF         .pdf                           every page copied
  Image       .jpg .jpeg .png                one page sized to the image
  Image       .gif .bmp .webp .tiff .tif     re-encoded to JPEG first

  URLs without a known extension are probed with a HEAD request and
  treated as PDFs when the Content-Type is inconclusive.

ENVIRONMENT VARIABLES:
  Every flag can also be set with PDFMERGE_<FLAG>, e.g. PDFMERGE_MODE=pdf-only.
  RUST_LOG overrides the log filter chosen by -v / -q.
"#;

/// Merge remote PDFs and images into a single PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfmerge",
    version,
    about = "Merge remote PDFs and images, in order, into a single PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// URLs of PDFs and images, in output order.
    #[arg(required = true, num_args = 1..)]
    urls: Vec<String>,

    /// Write the merged PDF to this file.
    #[arg(short, long, env = "PDFMERGE_OUTPUT", default_value = "merged.pdf")]
    output: PathBuf,

    /// Which URLs take part: mixed, pdf-only, images-only.
    #[arg(long, env = "PDFMERGE_MODE", value_enum, default_value = "mixed")]
    mode: ModeArg,

    /// Treat every URL as a PDF and reject URLs that do not look like one.
    #[arg(long, env = "PDFMERGE_VALIDATE_PDF", conflicts_with = "mode")]
    validate_pdf: bool,

    /// Print the per-item report as JSON on stdout.
    #[arg(long, env = "PDFMERGE_JSON")]
    json: bool,

    /// Per-download timeout in seconds.
    #[arg(long, env = "PDFMERGE_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Timeout for the HEAD probe on URLs without a known extension.
    #[arg(long, env = "PDFMERGE_PROBE_TIMEOUT", default_value_t = 10)]
    probe_timeout: u64,

    /// JPEG quality for re-encoded images (1–100).
    #[arg(long, env = "PDFMERGE_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Blank border around image pages, in points.
    #[arg(long, env = "PDFMERGE_MARGIN", default_value_t = 20.0)]
    margin: f32,

    /// Largest image page, and the size of placeholder pages.
    #[arg(long, env = "PDFMERGE_PAGE_SIZE", value_enum, default_value = "legal")]
    page_size: PageSizeArg,

    /// Disable progress bar.
    #[arg(long, env = "PDFMERGE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFMERGE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFMERGE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Mixed,
    PdfOnly,
    ImagesOnly,
}

impl From<ModeArg> for MergeMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Mixed => MergeMode::Mixed,
            ModeArg::PdfOnly => MergeMode::PdfOnly,
            ModeArg::ImagesOnly => MergeMode::ImagesOnly,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    Legal,
    Letter,
    A4,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::Legal => PageSize::LEGAL,
            PageSizeArg::Letter => PageSize::LETTER,
            PageSizeArg::A4 => PageSize::A4,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v asks for everything.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress_cb = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn MergeProgressCallback>);
    let config = build_config(&cli, progress_cb)?;

    // ── Run merge ────────────────────────────────────────────────────────
    let output = run_merge(&cli, &config, cli_progress.as_deref()).await?;

    let stats = output.stats.clone();
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
        println!("{json}");
    }

    write_pdf(&cli.output, output.into_bytes())
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if !cli.quiet {
        eprintln!(
            "{}  {} pages  {} bytes  {}ms  →  {}",
            if stats.placeholder_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.total_pages,
            stats.output_bytes,
            stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "{} PDFs, {} images  ·  download {}ms  ·  assembly {}ms",
                stats.pdf_items,
                stats.image_items,
                stats.download_duration_ms,
                stats.assembly_duration_ms
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `MergeConfig`.
/// Run the merge selected by the flags. On failure the progress bar is
/// cleared so the error is the last thing on stderr.
async fn run_merge(
    cli: &Cli,
    config: &MergeConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<MergeOutput> {
    let result = if cli.validate_pdf {
        merge_validated_pdf_urls(&cli.urls, config).await
    } else {
        merge(&cli.urls, cli.mode.into(), config).await
    };
    if result.is_err() {
        if let Some(cb) = progress {
            cb.clear();
        }
    }
    result.context("Merge failed")
}

fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<MergeConfig> {
    let mut builder = MergeConfig::builder()
        .download_timeout_secs(cli.download_timeout)
        .probe_timeout_secs(cli.probe_timeout)
        .jpeg_quality(cli.jpeg_quality)
        .page_margin(cli.margin)
        .reference_page(cli.page_size.into());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
