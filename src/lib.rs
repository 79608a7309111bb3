//! # cardsheet
//!
//! Turn a folder of card asset packs into printable card sheets.
//!
//! ## Why this crate?
//!
//! Card artwork tends to arrive scattered: single-card PDFs zipped up per
//! set, loose PDFs, loose PNGs. Printing them one file at a time wastes
//! paper and patience. This crate gathers every card-bearing source under an
//! assets directory, pulls the artwork out of the PDFs, and writes one PDF
//! with a 3×3 grid of cards per page, complete with cut guides.
//!
//! ## Pipeline Overview
//!
//! ```text
//! assets/
//!  │
//!  ├─ 1. Catalog   enumerate ZIP archives, loose PDFs, loose images
//!  ├─ 2. Extract   embedded images via lopdf, pdfium rasterisation fallback
//!  ├─ 3. Collect   materialise PNGs into a working dir + failure log
//!  ├─ 4. Sort      container name, then entry name (case-insensitive)
//!  └─ 5. Layout    3×3 grid per A4 page, cut marks, alpha-aware placement
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardsheet::{build, BuildConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BuildConfig::builder()
//!         .assets_dir("assets")
//!         .output_path("build/cards.pdf")
//!         .build()?;
//!     let report = build(&config)?;
//!     println!("{} cards on {} pages", report.stats.cards, report.stats.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! A single unreadable PDF never aborts a run. The primary extractor
//! (structural parse, embedded images) is tried first; on failure the
//! fallback (full-page rasterisation at 2×) takes over, and the incident is
//! recorded in the [`BuildReport`] so you can judge how faithful the output
//! is. Only an empty result set or a missing assets directory is fatal.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cardsheet` binary (clap + anyhow + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod build;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use build::{build, build_with};
pub use config::{BuildConfig, BuildConfigBuilder};
pub use error::CardsheetError;
pub use output::{BuildReport, BuildStats, CardImage, FailedSource};
pub use pipeline::rasterize::{PageRasterizer, PdfiumRasterizer};
pub use progress::{BuildProgress, NoopProgress};
