//! # resume-text
//!
//! Extract plain text from PDF resumes, however they were produced.
//!
//! A resume exported from a word processor has a perfect embedded text
//! layer; a scanned one has none; a designer's PDF has half a text layer and
//! the rest baked into images. No single extractor handles all three, so this
//! crate runs a cascade and picks (or merges) the best result by length.
//!
//! ## Cascade Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      check the path is a readable file
//!  ├─ 2. Text layer embedded text via lopdf (spawn_blocking)
//!  ├─ 3. OCR        pdfium render → grayscale → tesseract, only if 2 was thin
//!  ├─ 4. Select     length rules: accept one, combine both, or fall through
//!  ├─ 5. External   pdftotext under a timeout, then pdf-extract
//!  └─ 6. Finalize   punctuation/encoding cleanup
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_text::{Cascade, CascadeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cascade = Cascade::probe(CascadeConfig::default());
//!     let extraction = cascade.extract("resume.pdf").await?;
//!     println!("{}", extraction.text);
//!     eprintln!("selected: {}", extraction.selection);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2text` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `text-layer` | on | Embedded text via `lopdf` |
//! | `pdfium` | on     | Page rasterisation for OCR via a runtime-bound libpdfium |
//! | `pdf-extract-fallback` | on | In-process last-resort extractor |
//!
//! The OCR engine (`tesseract`) and the external tool (`pdftotext`) are
//! found on `PATH` at startup; see [`CapabilityRegistry::probe`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capabilities;
pub mod cascade;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod selection;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capabilities::{
    Capability, CapabilityRegistry, CapabilityReport, CapabilityStatus, DocumentExtractor,
    OcrEngine, Rasterizer, TextLayerReader,
};
pub use cascade::Cascade;
pub use config::{CascadeConfig, CascadeConfigBuilder, OcrProfile, OutputEncoding, StrategyToggles};
pub use error::{ExtractError, PageError, StrategyError};
pub use output::{Extraction, ExtractionAttempt, Selection, Strategy};
pub use pipeline::fallback::PdfToTextCommand;
pub use pipeline::postprocess::{finalize, sanitize};
pub use progress::{CascadeProgressCallback, NoopProgressCallback, ProgressCallback};
