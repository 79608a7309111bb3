//! Progress-observer trait for pipeline checkpoints.
//!
//! Inject an [`Arc<dyn BuildProgress>`] via
//! [`crate::config::BuildConfigBuilder::progress`] to receive events as the
//! collector works through sources and the layout engine writes pages.
//!
//! The pipeline is single-threaded, so observers are invoked synchronously
//! at well-defined points and need no internal locking. All methods have
//! default no-op bodies; implement only what you care about. Events are
//! purely advisory — ignoring them, or the totals being slightly off in an
//! observer, can never affect the produced card sheet.

use std::sync::Arc;

/// Called by the pipeline as it processes sources and writes pages.
pub trait BuildProgress {
    /// Called once before collection starts.
    ///
    /// `total_sources` is the catalog's advisory count: one unit per PDF or
    /// image entry the collector will process.
    fn on_collect_start(&self, total_sources: usize) {
        let _ = total_sources;
    }

    /// Called after each source unit (one PDF or one image entry) has been
    /// processed, successfully or not.
    fn on_source_processed(&self, container: &str, entry_name: &str) {
        let _ = (container, entry_name);
    }

    /// Called once before the first page is written, with the final page
    /// count (`ceil(cards / 9)`).
    fn on_layout_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each completed page. `page_num` is 1-indexed.
    fn on_page_written(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl BuildProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::BuildConfig`].
pub type ProgressObserver = Arc<dyn BuildProgress>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingProgress {
        sources: Cell<usize>,
        pages: Cell<usize>,
        announced_total: Cell<usize>,
    }

    impl BuildProgress for CountingProgress {
        fn on_collect_start(&self, total_sources: usize) {
            self.announced_total.set(total_sources);
        }

        fn on_source_processed(&self, _container: &str, _entry_name: &str) {
            self.sources.set(self.sources.get() + 1);
        }

        fn on_page_written(&self, _page_num: usize, _total_pages: usize) {
            self.pages.set(self.pages.get() + 1);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let p = NoopProgress;
        p.on_collect_start(5);
        p.on_source_processed("set1.zip", "a.pdf");
        p.on_layout_start(2);
        p.on_page_written(1, 2);
    }

    #[test]
    fn counting_observer_receives_events() {
        let p = CountingProgress {
            sources: Cell::new(0),
            pages: Cell::new(0),
            announced_total: Cell::new(0),
        };
        p.on_collect_start(3);
        p.on_source_processed("set1.zip", "a.pdf");
        p.on_source_processed("set1.zip", "b.pdf");
        p.on_source_processed("(direct)", "c.png");
        p.on_layout_start(1);
        p.on_page_written(1, 1);

        assert_eq!(p.announced_total.get(), 3);
        assert_eq!(p.sources.get(), 3);
        assert_eq!(p.pages.get(), 1);
    }
}
