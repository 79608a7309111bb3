//! Error types for the cardsheet library.
//!
//! Only *fatal* conditions live here: situations where the run cannot
//! produce a meaningful card sheet at all. Per-source extraction problems —
//! a corrupt PDF inside one archive, a page with no recoverable artwork —
//! are captured as [`crate::output::FailedSource`] records and returned as
//! data alongside the successful cards, so one bad file never costs you the
//! other two hundred.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cardsheet library.
///
/// Per-source extraction failures use [`crate::output::FailedSource`] and
/// are reported in the [`crate::output::BuildReport`] rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum CardsheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The assets root directory does not exist.
    #[error("Assets directory not found: '{path}'\nCheck the path or pass --assets-dir.")]
    AssetsDirMissing { path: PathBuf },

    /// Reading a ZIP archive failed at the container level.
    #[error("Failed to read ZIP archive '{path}': {detail}")]
    ZipRead { path: PathBuf, detail: String },

    // ── Collection errors ─────────────────────────────────────────────────
    /// The full scan finished without producing a single card.
    #[error("No card images found under '{assets_dir}'\nExpected *.zip archives, *.pdf files, or loose images (png/jpg/jpeg/gif/bmp/webp).")]
    NoCardsFound { assets_dir: PathBuf },

    // ── Layout errors ─────────────────────────────────────────────────────
    /// The layout engine was handed an empty card sequence.
    #[error("Nothing to lay out: the card sequence is empty")]
    NothingToLayOut,

    /// A collected card file could not be read back or decoded at layout
    /// time. This breaks the backing-file invariant and aborts the run.
    #[error("Cannot place card image '{path}': {detail}")]
    CardImageUnreadable { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a file in the working directory.
    #[error("Failed to write extracted image '{path}': {source}")]
    WorkDirWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
