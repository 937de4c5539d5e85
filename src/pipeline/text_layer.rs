//! Strategy 1: read the document's embedded text layer.
//!
//! Cheap and exact when the PDF was produced from a word processor; empty or
//! garbled for scans. Pages that fail to decode are skipped, the rest are
//! sanitised and joined.

use crate::capabilities::TextLayerReader;
use crate::error::{PageError, StrategyError};
use crate::output::{ExtractionAttempt, Strategy};
use crate::pipeline::postprocess::{join_pages, sanitize};
use crate::progress::ProgressCallback;
use crate::selection::char_len;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the text-layer strategy. Never fails; problems land in the attempt.
pub async fn run(
    reader: Arc<dyn TextLayerReader>,
    pdf_path: &Path,
    progress: &ProgressCallback,
) -> ExtractionAttempt {
    let start = Instant::now();
    let path = pdf_path.to_path_buf();

    let result = tokio::task::spawn_blocking(move || reader.read_pages(&path))
        .await
        .unwrap_or_else(|e| {
            Err(StrategyError::Panicked {
                detail: e.to_string(),
            })
        });

    let pages = match result {
        Ok(pages) => pages,
        Err(e) => {
            warn!("Text layer extraction failed: {}", e);
            return ExtractionAttempt::failed(
                Strategy::TextLayer,
                e,
                start.elapsed().as_millis() as u64,
            );
        }
    };

    let total_pages = pages.len();
    let mut texts = Vec::with_capacity(total_pages);
    let mut page_errors = Vec::new();

    for (idx, page) in pages.into_iter().enumerate() {
        let page_num = idx + 1;
        match page {
            Ok(raw) => {
                let text = sanitize(&raw);
                let chars = char_len(&text);
                debug!("Text layer page {}/{}: {} chars", page_num, total_pages, chars);
                progress.on_page_complete(Strategy::TextLayer, page_num, total_pages, chars);
                texts.push(text);
            }
            Err(e) => {
                warn!("{}", e);
                progress.on_page_error(Strategy::TextLayer, page_num, total_pages, &e.to_string());
                page_errors.push(e);
            }
        }
    }

    let text = join_pages(&texts);
    let attempt = ExtractionAttempt::succeeded(
        Strategy::TextLayer,
        text,
        total_pages,
        page_errors,
        start.elapsed().as_millis() as u64,
    );
    info!(
        "Text layer: {} pages, {} chars ({} pages skipped)",
        total_pages,
        attempt.chars,
        attempt.page_errors.len()
    );
    attempt
}

// ── lopdf backend ───────────────────────────────────────────────────────────

/// Embedded-text reader backed by `lopdf`.
#[cfg(feature = "text-layer")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfReader;

#[cfg(feature = "text-layer")]
impl TextLayerReader for LopdfReader {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn read_pages(&self, path: &Path) -> Result<Vec<Result<String, PageError>>, StrategyError> {
        let doc = lopdf::Document::load(path).map_err(|e| StrategyError::Unreadable {
            detail: e.to_string(),
        })?;

        let pages = doc.get_pages();
        debug!("lopdf: {} pages", pages.len());

        Ok(pages
            .keys()
            .map(|&page_num| {
                doc.extract_text(&[page_num])
                    .map_err(|e| PageError::TextLayerFailed {
                        page: page_num as usize,
                        detail: e.to_string(),
                    })
            })
            .collect())
    }
}
