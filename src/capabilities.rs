//! Extraction backends and the registry that says which ones exist.
//!
//! Each strategy in the cascade talks to its backend through one of the
//! traits below. [`CapabilityRegistry::probe`] fills the registry with the
//! compiled-in and installed defaults; tests and embedders build one by hand
//! with fakes instead.
//!
//! A missing capability never fails a run on its own. It only removes the
//! strategy that needs it.

use crate::config::OcrProfile;
use crate::error::{PageError, StrategyError};
use crate::pipeline::fallback::PdfToTextCommand;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Something the cascade may or may not have at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TextLayer,
    Rasterizer,
    OcrEngine,
    ExternalTool,
    LibraryFallback,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::TextLayer,
        Capability::Rasterizer,
        Capability::OcrEngine,
        Capability::ExternalTool,
        Capability::LibraryFallback,
    ];

    /// What to do about it when the capability is missing.
    pub fn install_hint(self) -> &'static str {
        match self {
            Capability::TextLayer => "rebuild with `--features text-layer`",
            Capability::Rasterizer => {
                "download libpdfium from https://github.com/bblanchon/pdfium-binaries \
                 and set PDFIUM_LIB_PATH (or place it next to the binary)"
            }
            Capability::OcrEngine => {
                "macOS: brew install tesseract | Ubuntu/Debian: sudo apt-get install tesseract-ocr \
                 | Windows: https://github.com/UB-Mannheim/tesseract/wiki (or set TESSERACT_CMD)"
            }
            Capability::ExternalTool => {
                "macOS: brew install poppler | Ubuntu/Debian: sudo apt-get install poppler-utils \
                 (or set PDFTOTEXT_CMD)"
            }
            Capability::LibraryFallback => "rebuild with `--features pdf-extract-fallback`",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::TextLayer => "text layer reader",
            Capability::Rasterizer => "PDF rasterizer",
            Capability::OcrEngine => "OCR engine",
            Capability::ExternalTool => "external text extractor",
            Capability::LibraryFallback => "library fallback extractor",
        })
    }
}

// ── Backend traits ───────────────────────────────────────────────────────

/// Reads the embedded text layer, one entry per page.
///
/// Called from a blocking thread.
pub trait TextLayerReader: Send + Sync {
    fn name(&self) -> &str;

    /// `Err` when the document cannot be opened at all; per-page failures go
    /// into the returned vector.
    fn read_pages(&self, path: &Path) -> Result<Vec<Result<String, PageError>>, StrategyError>;
}

/// Renders pages to bitmaps.
///
/// Called from a blocking thread. Pages are handed to `on_page` one at a
/// time, in order, so a long document never holds every bitmap at once.
pub trait Rasterizer: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the page count. `on_page` receives `(page_num, total, image)`
    /// with a 1-indexed `page_num`.
    fn rasterize(
        &self,
        path: &Path,
        zoom: f32,
        on_page: &mut dyn FnMut(usize, usize, Result<DynamicImage, PageError>),
    ) -> Result<usize, StrategyError>;
}

/// Recognises text in one page image.
///
/// Called from a blocking thread.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        profile: &OcrProfile,
    ) -> Result<String, StrategyError>;
}

/// Extracts a whole document's text in one call.
///
/// Called from a blocking thread.
pub trait DocumentExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, path: &Path) -> Result<String, StrategyError>;
}

// ── Registry ─────────────────────────────────────────────────────────────

/// The backends available to one [`crate::cascade::Cascade`].
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    text_layer: Option<Arc<dyn TextLayerReader>>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    ocr_engine: Option<Arc<dyn OcrEngine>>,
    external_tool: Option<PdfToTextCommand>,
    library_fallback: Option<Arc<dyn DocumentExtractor>>,
    /// Why a probed capability is missing.
    probe_notes: Vec<(Capability, String)>,
}

impl CapabilityRegistry {
    /// A registry with nothing in it. Every strategy is unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the default backends for this machine.
    ///
    /// Logs a warning for every capability that is missing.
    pub fn probe() -> Self {
        let mut registry = Self::empty();

        #[cfg(feature = "text-layer")]
        {
            registry.text_layer = Some(Arc::new(crate::pipeline::text_layer::LopdfReader));
        }
        #[cfg(not(feature = "text-layer"))]
        registry
            .probe_notes
            .push((Capability::TextLayer, "not compiled in".into()));

        #[cfg(feature = "pdfium")]
        match crate::pipeline::render::PdfiumRasterizer::probe() {
            Ok(r) => registry.rasterizer = Some(Arc::new(r)),
            Err(e) => registry.probe_notes.push((Capability::Rasterizer, e)),
        }
        #[cfg(not(feature = "pdfium"))]
        registry
            .probe_notes
            .push((Capability::Rasterizer, "not compiled in".into()));

        match crate::pipeline::ocr::TesseractCli::probe() {
            Ok(t) => registry.ocr_engine = Some(Arc::new(t)),
            Err(e) => registry.probe_notes.push((Capability::OcrEngine, e)),
        }

        match PdfToTextCommand::probe() {
            Ok(c) => registry.external_tool = Some(c),
            Err(e) => registry.probe_notes.push((Capability::ExternalTool, e)),
        }

        #[cfg(feature = "pdf-extract-fallback")]
        {
            registry.library_fallback =
                Some(Arc::new(crate::pipeline::fallback::PdfExtractLibrary));
        }
        #[cfg(not(feature = "pdf-extract-fallback"))]
        registry
            .probe_notes
            .push((Capability::LibraryFallback, "not compiled in".into()));

        for (cap, note) in &registry.probe_notes {
            warn!("{cap} unavailable ({note}); install hint: {}", cap.install_hint());
        }
        debug!("Capabilities: {:?}", registry);
        registry
    }

    pub fn with_text_layer(mut self, reader: Arc<dyn TextLayerReader>) -> Self {
        self.text_layer = Some(reader);
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn with_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn with_external_tool(mut self, tool: PdfToTextCommand) -> Self {
        self.external_tool = Some(tool);
        self
    }

    pub fn with_library_fallback(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.library_fallback = Some(extractor);
        self
    }

    pub fn text_layer(&self) -> Option<&Arc<dyn TextLayerReader>> {
        self.text_layer.as_ref()
    }

    /// Both halves of the OCR strategy, or the first one that is missing.
    pub fn ocr(&self) -> Result<(&Arc<dyn Rasterizer>, &Arc<dyn OcrEngine>), Capability> {
        let rasterizer = self.rasterizer.as_ref().ok_or(Capability::Rasterizer)?;
        let engine = self.ocr_engine.as_ref().ok_or(Capability::OcrEngine)?;
        Ok((rasterizer, engine))
    }

    pub fn external_tool(&self) -> Option<&PdfToTextCommand> {
        self.external_tool.as_ref()
    }

    pub fn library_fallback(&self) -> Option<&Arc<dyn DocumentExtractor>> {
        self.library_fallback.as_ref()
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.backend_name(capability).is_some()
    }

    fn backend_name(&self, capability: Capability) -> Option<String> {
        match capability {
            Capability::TextLayer => self.text_layer.as_ref().map(|b| b.name().to_string()),
            Capability::Rasterizer => self.rasterizer.as_ref().map(|b| b.name().to_string()),
            Capability::OcrEngine => self.ocr_engine.as_ref().map(|b| b.name().to_string()),
            Capability::ExternalTool => self
                .external_tool
                .as_ref()
                .map(|c| c.program().display().to_string()),
            Capability::LibraryFallback => {
                self.library_fallback.as_ref().map(|b| b.name().to_string())
            }
        }
    }

    /// Availability of every capability, for `--check-deps`.
    pub fn report(&self) -> CapabilityReport {
        let entries = Capability::ALL
            .iter()
            .map(|&capability| {
                let backend = self.backend_name(capability);
                let available = backend.is_some();
                CapabilityStatus {
                    capability,
                    available,
                    backend,
                    detail: self
                        .probe_notes
                        .iter()
                        .find(|(c, _)| *c == capability)
                        .map(|(_, note)| note.clone()),
                    install_hint: (!available).then(|| capability.install_hint().to_string()),
                }
            })
            .collect();
        CapabilityReport { entries }
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CapabilityRegistry");
        for cap in Capability::ALL {
            let field = match cap {
                Capability::TextLayer => "text_layer",
                Capability::Rasterizer => "rasterizer",
                Capability::OcrEngine => "ocr_engine",
                Capability::ExternalTool => "external_tool",
                Capability::LibraryFallback => "library_fallback",
            };
            d.field(field, &self.backend_name(cap));
        }
        d.finish()
    }
}

// ── Report ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityStatus {
    pub capability: Capability,
    pub available: bool,
    /// Backend name, or the resolved program path for command-line tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub entries: Vec<CapabilityStatus>,
}

impl CapabilityReport {
    /// `true` when at least one strategy can run.
    pub fn any_strategy(&self) -> bool {
        let has = |c: Capability| self.entries.iter().any(|e| e.capability == c && e.available);
        has(Capability::TextLayer)
            || (has(Capability::Rasterizer) && has(Capability::OcrEngine))
            || has(Capability::ExternalTool)
            || has(Capability::LibraryFallback)
    }
}

impl fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            let mark = if e.available { "✓" } else { "✗" };
            write!(f, "{mark} {:<28}", e.capability.to_string())?;
            match (&e.backend, &e.detail) {
                (Some(b), _) => write!(f, " {b}")?,
                (None, Some(d)) => write!(f, " {d}")?,
                (None, None) => {}
            }
            writeln!(f)?;
            if let Some(ref hint) = e.install_hint {
                writeln!(f, "    → {hint}")?;
            }
        }
        Ok(())
    }
}
