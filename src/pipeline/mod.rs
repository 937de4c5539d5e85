//! Pipeline stages for the extraction cascade.
//!
//! Each submodule implements one step. Strategy modules expose an async
//! `run` that always returns an [`crate::output::ExtractionAttempt`]; the
//! blocking backend call happens inside `spawn_blocking`.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text_layer ──▶ ocr (render + tesseract) ──▶ fallback ──▶ postprocess
//! (path)     (lopdf)        (pdfium)                    (pdftotext,   (finalize)
//!                                                        pdf-extract)
//! ```
//!
//! 1. [`input`]      — check the path is a readable regular file
//! 2. [`text_layer`] — embedded text, page by page
//! 3. [`render`]     — rasterise pages for OCR (`pdfium` feature)
//! 4. [`ocr`]        — recognise rendered pages, with a per-page profile retry
//! 5. [`fallback`]   — external tool under a timeout, then the library extractor
//! 6. [`postprocess`] — sanitising, page joining, output-encoding repair

pub mod fallback;
pub mod input;
pub mod ocr;
pub mod postprocess;
#[cfg(feature = "pdfium")]
pub mod render;
pub mod text_layer;
