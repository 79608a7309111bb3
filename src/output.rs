//! Output records produced by a build run.
//!
//! Two kinds of data flow out of the pipeline: the cards themselves
//! ([`CardImage`], one per printable grid cell) and the failure log
//! ([`FailedSource`], one per PDF whose primary extraction did not
//! succeed). Both are plain values — the collector returns them, the
//! orchestrator aggregates them into a [`BuildReport`], and nothing is
//! stashed in process-wide state between runs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One successfully materialised card: a PNG on disk plus enough source
/// information to sort and report on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardImage {
    /// Human-readable container name: the ZIP filename (`"set1.zip"`) or
    /// `"(direct)"` for loose files.
    pub container: String,
    /// Original entry name inside the container (PDF or image filename).
    /// Used as the secondary sort key and in reports.
    pub entry_name: String,
    /// Path to the normalised raster file in the working directory.
    /// Guaranteed to exist at the time the card is appended.
    pub image_path: PathBuf,
}

/// A PDF whose primary extraction failed.
///
/// `used_fallback` distinguishes a degraded success (the rasterisation
/// fallback produced output — at least one [`CardImage`] exists for this
/// source) from a total failure (both methods failed — zero cards).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedSource {
    /// Container display name, same convention as [`CardImage::container`].
    pub container: String,
    /// Entry name of the failing PDF.
    pub entry_name: String,
    /// The primary method's error text (or the fallback's, on total failure).
    pub error: String,
    /// True when the fallback rescued the source.
    pub used_fallback: bool,
}

/// Aggregate counters for one build run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Cards placed on the sheet.
    pub cards: usize,
    /// Pages written: `ceil(cards / 9)`.
    pub pages: usize,
    /// Size of the output PDF in bytes.
    pub output_bytes: u64,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

/// Everything the orchestrator knows at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    pub stats: BuildStats,
    /// Where the card sheet was written.
    pub output_path: PathBuf,
    /// Sources rescued by the rasterisation fallback (degraded success).
    pub fallback_rescued: Vec<FailedSource>,
    /// Sources that produced no cards at all.
    pub failed: Vec<FailedSource>,
}

impl BuildReport {
    /// Partition a raw failure log into the report's two groups,
    /// preserving log order within each group.
    pub fn partition_failures(log: Vec<FailedSource>) -> (Vec<FailedSource>, Vec<FailedSource>) {
        log.into_iter().partition(|f| f.used_fallback)
    }
}

/// Human-readable file size, e.g. `"1.5 MB"` or `"256.0 KB"`.
pub fn human_file_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}
