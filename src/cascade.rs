//! The extraction cascade: run strategies in order and pick a result.
//!
//! ```text
//! text layer ── > substantial ──────────────────────────────▶ accept
//!      │
//!      ▼
//!     OCR ───── decide(text layer, OCR) ── decided ─────────▶ accept / combine
//!      │
//!      ▼
//!  external ── non-empty ──────────────────────────────────▶ accept
//!      │
//!      ▼
//!  leftover short candidate ───────────────────────────────▶ best effort
//!      │
//!      ▼
//!  Exhausted
//! ```
//!
//! Strategies never run concurrently, and each one runs at most once per
//! document.

use crate::capabilities::{Capability, CapabilityRegistry};
use crate::config::CascadeConfig;
use crate::error::{ExtractError, StrategyError};
use crate::output::{Extraction, ExtractionAttempt, Selection, Strategy};
use crate::pipeline::{fallback, input, ocr, postprocess, text_layer};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::selection::{self, char_len, classify_text_layer, Decision, TextLayerClass};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A configured cascade bound to a set of backends.
///
/// Cheap to clone; holds no per-document state.
#[derive(Debug, Clone)]
pub struct Cascade {
    config: CascadeConfig,
    capabilities: CapabilityRegistry,
}

impl Cascade {
    pub fn new(config: CascadeConfig, capabilities: CapabilityRegistry) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    /// A cascade using whatever backends this machine provides.
    pub fn probe(config: CascadeConfig) -> Self {
        Self::new(config, CapabilityRegistry::probe())
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Extract the text of one PDF.
    ///
    /// # Errors
    /// Only fatal errors are returned: the path is missing, unreadable or
    /// not a file, or no strategy produced any text
    /// ([`ExtractError::Exhausted`]). Strategy and page failures are recorded
    /// in [`Extraction::attempts`].
    pub async fn extract(&self, pdf_path: impl AsRef<Path>) -> Result<Extraction, ExtractError> {
        let start = Instant::now();
        let path = input::resolve_local(pdf_path.as_ref())?;
        info!("Extracting text from {}", path.display());

        let cfg = &self.config;
        let progress = self.progress();
        let mut attempts = Vec::with_capacity(3);

        // ── Step 1: embedded text layer ──────────────────────────────────
        let embedded = self.run_text_layer(&path, &progress).await;
        let class = classify_text_layer(embedded.chars, cfg);
        debug!("Text layer classified as {:?} ({} chars)", class, embedded.chars);
        attempts.push(embedded);

        if class == TextLayerClass::Substantial {
            let text = attempts[0].text.clone();
            return self.finish(&path, text, Selection::TextLayer, attempts, start);
        }

        // ── Step 2: OCR, then weigh both ─────────────────────────────────
        let recognised = self.run_ocr(&path, &progress).await;
        attempts.push(recognised);

        let (embedded, recognised) = (&attempts[0], &attempts[1]);
        let decided = match selection::decide(embedded.chars, recognised.chars, cfg) {
            Decision::UseTextLayer => Some((embedded.text.clone(), Selection::TextLayer)),
            Decision::UseOcr => Some((recognised.text.clone(), Selection::Ocr)),
            Decision::Combine => Some((
                selection::combine(&embedded.text, &recognised.text),
                Selection::Combined,
            )),
            Decision::Undecided => None,
        };
        if let Some((text, sel)) = decided {
            return self.finish(&path, text, sel, attempts, start);
        }

        // ── Step 3: external tool / library ──────────────────────────────
        let external = self.run_external(&path, &progress).await;
        attempts.push(external);

        if !attempts[2].is_empty() {
            let text = attempts[2].text.clone();
            return self.finish(&path, text, Selection::External, attempts, start);
        }

        // ── Step 4: whatever short text is left ──────────────────────────
        let (embedded, recognised) = (&attempts[0], &attempts[1]);
        let leftover = if !embedded.is_empty() && embedded.chars >= recognised.chars {
            Some(embedded)
        } else if !recognised.is_empty() {
            Some(recognised)
        } else {
            None
        };
        if let Some(candidate) = leftover {
            warn!(
                "Only {} chars of {} text found; returning it as best effort",
                candidate.chars, candidate.strategy
            );
            let (text, strategy) = (candidate.text.clone(), candidate.strategy);
            return self.finish(&path, text, Selection::BestEffort(strategy), attempts, start);
        }

        Err(exhausted(&path, &attempts))
    }

    /// Extract and write the text to `output_path`.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub async fn extract_to_file(
        &self,
        pdf_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<Extraction, ExtractError> {
        let extraction = self.extract(pdf_path).await?;
        let path = output_path.as_ref();

        let write_err = |e: std::io::Error| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("txt.tmp");
        let mut contents = extraction.text.clone();
        contents.push('\n');
        tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        Ok(extraction)
    }

    /// Synchronous wrapper around [`Cascade::extract`].
    ///
    /// Creates a temporary tokio runtime internally.
    pub fn extract_sync(&self, pdf_path: impl AsRef<Path>) -> Result<Extraction, ExtractError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.extract(pdf_path))
    }

    // ── Strategy dispatch ────────────────────────────────────────────────

    fn progress(&self) -> ProgressCallback {
        self.config
            .progress_callback
            .clone()
            .unwrap_or_else(|| Arc::new(NoopProgressCallback))
    }

    async fn run_text_layer(&self, path: &Path, progress: &ProgressCallback) -> ExtractionAttempt {
        let reader = match self.capabilities.text_layer() {
            Some(r) if self.config.strategies.text_layer => r.clone(),
            _ => return unavailable(Strategy::TextLayer, Capability::TextLayer),
        };
        progress.on_strategy_start(Strategy::TextLayer);
        let attempt = self.encoded(text_layer::run(reader, path, progress).await);
        progress.on_strategy_complete(Strategy::TextLayer, attempt.chars);
        attempt
    }

    async fn run_ocr(&self, path: &Path, progress: &ProgressCallback) -> ExtractionAttempt {
        if !self.config.strategies.ocr {
            return unavailable(Strategy::Ocr, Capability::OcrEngine);
        }
        let (rasterizer, engine) = match self.capabilities.ocr() {
            Ok((r, e)) => (r.clone(), e.clone()),
            Err(missing) => return unavailable(Strategy::Ocr, missing),
        };
        progress.on_strategy_start(Strategy::Ocr);
        let attempt = self.encoded(ocr::run(rasterizer, engine, path, &self.config, progress).await);
        progress.on_strategy_complete(Strategy::Ocr, attempt.chars);
        attempt
    }

    async fn run_external(&self, path: &Path, progress: &ProgressCallback) -> ExtractionAttempt {
        if !self.config.strategies.external {
            return unavailable(Strategy::External, Capability::ExternalTool);
        }
        progress.on_strategy_start(Strategy::External);
        let attempt = self.encoded(
            fallback::run(&self.capabilities, path, self.config.external_timeout()).await,
        );
        progress.on_strategy_complete(Strategy::External, attempt.chars);
        attempt
    }

    /// Apply the output encoding as soon as an attempt is recorded, so the
    /// length rules see the text the caller would actually get. Text that
    /// the encoding empties makes the attempt empty and the cascade moves on.
    fn encoded(&self, mut attempt: ExtractionAttempt) -> ExtractionAttempt {
        if attempt.text.is_empty() {
            return attempt;
        }
        attempt.text = postprocess::finalize(&attempt.text, self.config.output_encoding);
        let chars = char_len(&attempt.text);
        if chars == 0 && attempt.chars > 0 {
            debug!(
                "{} text is empty in {:?} output ({} chars dropped)",
                attempt.strategy, self.config.output_encoding, attempt.chars
            );
        }
        attempt.chars = chars;
        attempt
    }

    fn finish(
        &self,
        path: &Path,
        text: String,
        selection: Selection,
        attempts: Vec<ExtractionAttempt>,
        start: Instant,
    ) -> Result<Extraction, ExtractError> {
        let text = postprocess::finalize(&text, self.config.output_encoding);
        let chars = char_len(&text);
        if chars == 0 {
            return Err(exhausted(path, &attempts));
        }

        info!("Selected {} ({} chars)", selection, chars);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_selection(selection, chars);
        }

        Ok(Extraction {
            text,
            selection,
            attempts,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn unavailable(strategy: Strategy, capability: Capability) -> ExtractionAttempt {
    debug!("{} strategy skipped: {} not available", strategy, capability);
    ExtractionAttempt::failed(strategy, StrategyError::Unavailable { capability }, 0)
}

fn exhausted(path: &Path, attempts: &[ExtractionAttempt]) -> ExtractError {
    let attempted = attempts
        .iter()
        .filter(|a| !matches!(a.error, Some(StrategyError::Unavailable { .. })))
        .count();
    warn!("No strategy produced text ({} attempted)", attempted);
    ExtractError::Exhausted {
        path: path.to_path_buf(),
        attempted,
    }
}
