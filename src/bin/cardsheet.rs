//! CLI binary for cardsheet.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `BuildConfig` and renders the build report.

use anyhow::{Context, Result};
use cardsheet::{build, BuildConfig, BuildProgress, BuildReport, FailedSource};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Most failure rows shown per group before eliding the rest.
const MAX_FAILURE_ROWS: usize = 20;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal progress observer: one bar that first tracks source collection,
/// then resets to track page layout.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        // Spinner only until the catalog announces a source count.
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Reading assets…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate(&self, prefix: &str, unit: &str, total: usize) {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_style(style);
        self.bar.set_prefix(prefix.to_string());
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BuildProgress for CliProgress {
    fn on_collect_start(&self, total_sources: usize) {
        self.activate("Collecting", "sources", total_sources);
    }

    fn on_source_processed(&self, container: &str, entry_name: &str) {
        self.bar.set_message(format!("{container}: {entry_name}"));
        self.bar.inc(1);
    }

    fn on_layout_start(&self, total_pages: usize) {
        self.activate("Laying out", "pages", total_pages);
        self.bar.set_message(String::new());
    }

    fn on_page_written(&self, page_num: usize, _total_pages: usize) {
        self.bar.set_message(format!("page {page_num}"));
        self.bar.inc(1);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Build build/cards.pdf from ./assets
  cardsheet

  # Different assets folder and output path
  cardsheet --assets-dir ~/Downloads/card-packs --output print/cards.pdf

  # See exactly which PDFs the structural extractor handles
  cardsheet --no-fallback

  # Machine-readable summary
  cardsheet --json > report.json

INPUTS (scanned non-recursively under the assets directory):
  *.zip    archives; PDF and image entries inside are collected
  *.pdf    loose single- or multi-card PDFs
  images   loose png/jpg/jpeg/gif/bmp/webp files

ENVIRONMENT VARIABLES:
  CARDSHEET_ASSETS_DIR   Assets directory (same as --assets-dir)
  CARDSHEET_OUTPUT       Output PDF path (same as --output)
  CARDSHEET_IMAGES_DIR   Working directory for extracted PNGs

  The rasterisation fallback needs a pdfium shared library, looked up next
  to the executable and then on the system library path. Without one,
  sources needing the fallback are reported as failures; everything else
  still builds.
"#;

/// Build a printable card-sheet PDF from a folder of card assets.
#[derive(Parser, Debug)]
#[command(
    name = "cardsheet",
    version,
    about = "Build a printable card-sheet PDF from a folder of card assets",
    long_about = "Collect card artwork from ZIP archives, loose PDFs, and loose images under an \
assets directory, then lay the cards out nine to an A4 page with cut marks, ready to print \
and trim.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned for ZIP archives, PDFs, and images.
    #[arg(short, long, env = "CARDSHEET_ASSETS_DIR", default_value = "assets")]
    assets_dir: PathBuf,

    /// Output PDF path. Parent directories are created.
    #[arg(short, long, env = "CARDSHEET_OUTPUT", default_value = "build/cards.pdf")]
    output: PathBuf,

    /// Working directory for extracted card PNGs.
    #[arg(long, env = "CARDSHEET_IMAGES_DIR", default_value = ".temp/images")]
    images_dir: PathBuf,

    /// Disable the page-rasterisation fallback for unparseable PDFs.
    #[arg(long, env = "CARDSHEET_NO_FALLBACK")]
    no_fallback: bool,

    /// Output the build report as JSON instead of the summary.
    #[arg(long, env = "CARDSHEET_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "CARDSHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDSHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CARDSHEET_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgress::new);

    let mut builder = BuildConfig::builder()
        .assets_dir(&cli.assets_dir)
        .output_path(&cli.output)
        .images_dir(&cli.images_dir)
        .fallback_enabled(!cli.no_fallback);
    if let Some(ref p) = progress {
        builder = builder.progress(Arc::clone(p) as Arc<dyn BuildProgress>);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run the build ────────────────────────────────────────────────────
    let result = build(&config);
    if let Some(ref p) = progress {
        p.finish();
    }
    let report = result.context("Build failed")?;

    // ── Render the report ────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &BuildReport) {
    let tick = if report.failed.is_empty() {
        green("✔")
    } else {
        yellow("⚠")
    };
    eprintln!(
        "{tick}  {} cards on {} pages  →  {}  {}",
        bold(&report.stats.cards.to_string()),
        report.stats.pages,
        bold(&report.output_path.display().to_string()),
        dim(&format!(
            "({}, {}ms)",
            cardsheet::output::human_file_size(report.stats.output_bytes),
            report.stats.duration_ms
        )),
    );

    if !report.fallback_rescued.is_empty() {
        eprintln!(
            "\n{} {}",
            cyan("◆"),
            bold(&format!(
                "{} source(s) rescued by page rasterisation (artwork is a full-page render):",
                report.fallback_rescued.len()
            ))
        );
        print_failure_rows(&report.fallback_rescued, |s| yellow(s));
    }

    if !report.failed.is_empty() {
        eprintln!(
            "\n{} {}",
            red("✗"),
            bold(&format!(
                "{} source(s) produced no cards:",
                report.failed.len()
            ))
        );
        print_failure_rows(&report.failed, |s| red(s));
    }
}

fn print_failure_rows(rows: &[FailedSource], paint: impl Fn(&str) -> String) {
    for row in rows.iter().take(MAX_FAILURE_ROWS) {
        // Truncate very long error messages to keep output tidy.
        let msg = if row.error.chars().count() > 80 {
            let cut: String = row.error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            row.error.clone()
        };
        eprintln!(
            "  {} {:<14} {:<30} {}",
            paint("·"),
            row.container,
            row.entry_name,
            dim(&msg)
        );
    }
    if rows.len() > MAX_FAILURE_ROWS {
        eprintln!("  {}", dim(&format!("… and {} more", rows.len() - MAX_FAILURE_ROWS)));
    }
}
