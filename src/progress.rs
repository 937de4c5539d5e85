//! Progress-callback trait for cascade events.
//!
//! Inject an [`Arc<dyn CascadeProgressCallback>`] via
//! [`crate::config::CascadeConfigBuilder::progress_callback`] to receive
//! events as each strategy runs and as pages are read or recognised.
//!
//! # Example
//!
//! ```rust
//! use resume_text::{CascadeConfig, CascadeProgressCallback, Strategy};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl CascadeProgressCallback for PageCounter {
//!     fn on_page_complete(&self, strategy: Strategy, page_num: usize, total_pages: usize, chars: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{strategy}: page {page_num}/{total_pages} ({chars} chars)");
//!     }
//! }
//!
//! let config = CascadeConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{Selection, Strategy};
use std::sync::Arc;

/// Called by the cascade as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Strategies run one after another, so calls for one
/// document never overlap, but the callback may be invoked from a blocking
/// worker thread.
pub trait CascadeProgressCallback: Send + Sync {
    /// Called before a strategy starts.
    fn on_strategy_start(&self, strategy: Strategy) {
        let _ = strategy;
    }

    /// Called when a page's text has been produced by `strategy`.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    /// * `chars`       — character count of the page's text
    fn on_page_complete(&self, strategy: Strategy, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (strategy, page_num, total_pages, chars);
    }

    /// Called when a page is skipped after a render, read or OCR failure.
    fn on_page_error(&self, strategy: Strategy, page_num: usize, total_pages: usize, error: &str) {
        let _ = (strategy, page_num, total_pages, error);
    }

    /// Called once a strategy has finished, successfully or not.
    ///
    /// `chars` is 0 when the strategy failed or produced nothing.
    fn on_strategy_complete(&self, strategy: Strategy, chars: usize) {
        let _ = (strategy, chars);
    }

    /// Called once with the branch the selection policy took.
    fn on_selection(&self, selection: Selection, chars: usize) {
        let _ = (selection, chars);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl CascadeProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CascadeConfig`].
pub type ProgressCallback = Arc<dyn CascadeProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started: Mutex<Vec<Strategy>>,
        pages: AtomicUsize,
        errors: AtomicUsize,
        selected: Mutex<Option<Selection>>,
    }

    impl CascadeProgressCallback for TrackingCallback {
        fn on_strategy_start(&self, strategy: Strategy) {
            self.started.lock().unwrap().push(strategy);
        }

        fn on_page_complete(&self, _: Strategy, _: usize, _: usize, _: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _: Strategy, _: usize, _: usize, _: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_selection(&self, selection: Selection, _chars: usize) {
            *self.selected.lock().unwrap() = Some(selection);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_strategy_start(Strategy::TextLayer);
        cb.on_page_complete(Strategy::TextLayer, 1, 2, 42);
        cb.on_page_error(Strategy::Ocr, 2, 2, "render failed");
        cb.on_strategy_complete(Strategy::Ocr, 0);
        cb.on_selection(Selection::TextLayer, 42);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_strategy_start(Strategy::TextLayer);
        tracker.on_page_complete(Strategy::TextLayer, 1, 2, 10);
        tracker.on_page_error(Strategy::TextLayer, 2, 2, "bad stream");
        tracker.on_strategy_start(Strategy::Ocr);
        tracker.on_page_complete(Strategy::Ocr, 1, 2, 80);
        tracker.on_page_complete(Strategy::Ocr, 2, 2, 75);
        tracker.on_selection(Selection::Combined, 165);

        assert_eq!(
            *tracker.started.lock().unwrap(),
            vec![Strategy::TextLayer, Strategy::Ocr]
        );
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.selected.lock().unwrap(), Some(Selection::Combined));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_strategy_start(Strategy::External);
        cb.on_strategy_complete(Strategy::External, 512);
    }
}
