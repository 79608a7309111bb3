//! Pipeline orchestration: collect, sort, lay out, report.
//!
//! [`build`] is the library's front door; [`build_with`] additionally
//! accepts the rasterisation backend, which is how tests run the whole
//! pipeline without a native PDF renderer installed.

use crate::config::BuildConfig;
use crate::error::CardsheetError;
use crate::output::{BuildReport, BuildStats, CardImage};
use crate::pipeline::collect::collect_cards;
use crate::pipeline::layout::write_card_sheet;
use crate::pipeline::rasterize::{PageRasterizer, PdfiumRasterizer};
use std::time::Instant;
use tracing::info;

/// Run the full build with the production pdfium fallback backend.
pub fn build(config: &BuildConfig) -> Result<BuildReport, CardsheetError> {
    build_with(config, &PdfiumRasterizer)
}

/// Run the full build with an explicit rasterisation backend.
pub fn build_with(
    config: &BuildConfig,
    rasterizer: &dyn PageRasterizer,
) -> Result<BuildReport, CardsheetError> {
    let started = Instant::now();
    info!(config = ?config, "Starting card-sheet build");

    if let Some(parent) = config.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CardsheetError::OutputWriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let progress = config.progress.as_ref();
    let (mut cards, failure_log) = collect_cards(
        &config.assets_dir,
        &config.images_dir,
        rasterizer,
        config.fallback_enabled,
        progress,
    )?;

    if cards.is_empty() {
        return Err(CardsheetError::NoCardsFound {
            assets_dir: config.assets_dir.clone(),
        });
    }

    sort_cards(&mut cards);

    let pages = write_card_sheet(
        &cards,
        &config.output_path,
        config.card_width,
        config.card_height,
        progress,
    )?;

    let output_bytes = std::fs::metadata(&config.output_path)
        .map(|m| m.len())
        .unwrap_or(0);
    let (fallback_rescued, failed) = BuildReport::partition_failures(failure_log);

    let report = BuildReport {
        stats: BuildStats {
            cards: cards.len(),
            pages,
            output_bytes,
            duration_ms: started.elapsed().as_millis() as u64,
        },
        output_path: config.output_path.clone(),
        fallback_rescued,
        failed,
    };

    info!(
        cards = report.stats.cards,
        pages = report.stats.pages,
        rescued = report.fallback_rescued.len(),
        failed = report.failed.len(),
        "Build finished"
    );
    Ok(report)
}

/// Total order over cards: case-insensitive container name, then
/// case-insensitive entry name. The sort is stable, so the multi-page
/// output of a single PDF keeps its page order.
fn sort_cards(cards: &mut [CardImage]) {
    cards.sort_by(|a, b| {
        (a.container.to_lowercase(), a.entry_name.to_lowercase())
            .cmp(&(b.container.to_lowercase(), b.entry_name.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn card(container: &str, entry: &str, path: &str) -> CardImage {
        CardImage {
            container: container.into(),
            entry_name: entry.into(),
            image_path: PathBuf::from(path),
        }
    }

    #[test]
    fn sort_is_case_insensitive_and_stable() {
        let mut cards = vec![
            card("Set2.zip", "a.pdf", "p0"),
            card("set1.zip", "B.pdf", "p1"),
            card("set1.zip", "b.pdf", "p2"),
            card("set1.zip", "a.pdf", "p3"),
        ];
        sort_cards(&mut cards);

        let order: Vec<&str> = cards
            .iter()
            .map(|c| c.image_path.to_str().unwrap())
            .collect();
        // "B.pdf" and "b.pdf" compare equal, so their input order survives.
        assert_eq!(order, ["p3", "p1", "p2", "p0"]);
    }

    #[test]
    fn sorting_twice_changes_nothing() {
        let mut cards = vec![
            card("set1.zip", "z.pdf", "p0"),
            card("set1.zip", "z.pdf", "p1"),
            card("(direct)", "a.png", "p2"),
        ];
        sort_cards(&mut cards);
        let once: Vec<PathBuf> = cards.iter().map(|c| c.image_path.clone()).collect();
        sort_cards(&mut cards);
        let twice: Vec<PathBuf> = cards.iter().map(|c| c.image_path.clone()).collect();
        assert_eq!(once, twice);
    }
}
