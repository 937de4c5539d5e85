//! Error types for the resume-text library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`ExtractError`] — **Fatal**: the cascade cannot produce any text for
//!   this document (missing file, every strategy came back empty). Returned as
//!   `Err(ExtractError)` from [`crate::cascade::Cascade::extract`]. This is the
//!   only error a caller of the cascade observes directly.
//!
//! * [`StrategyError`] — **Non-fatal**: one strategy could not run (capability
//!   missing, document unreadable by that backend, external tool timed out).
//!   Stored in [`crate::output::ExtractionAttempt`]; the cascade moves on to
//!   the next strategy.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed inside a strategy
//!   that otherwise ran. Stored alongside the attempt so one corrupt page does
//!   not cost the whole document.

use std::path::PathBuf;
use thiserror::Error;

use crate::capabilities::Capability;

/// All fatal errors returned by the resume-text library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File {} not found", .path.display())]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{}'\nTry: chmod +r {path:?}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// The path exists but is a directory or other non-file entry.
    #[error("'{}' is not a regular file", .path.display())]
    NotAFile { path: PathBuf },

    // ── Cascade errors ────────────────────────────────────────────────────
    /// Every strategy ran (or was unavailable) and none produced text.
    #[error(
        "Could not extract text from PDF '{}' ({attempted} strategies attempted)",
        .path.display()
    )]
    Exhausted { path: PathBuf, attempted: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output text file.
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single strategy produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyError {
    /// The capability backing this strategy is not installed or was disabled.
    #[error("{capability} is not available")]
    Unavailable { capability: Capability },

    /// The backend could not open or parse the document at all.
    #[error("document could not be read: {detail}")]
    Unreadable { detail: String },

    /// An external program could not be started.
    #[error("{tool} could not be started: {detail}")]
    ToolMissing { tool: String, detail: String },

    /// An external program ran but exited unsuccessfully.
    #[error("{tool} exited with status {status:?}: {stderr}")]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// An external program exceeded its time budget and was killed.
    #[error("{tool} timed out after {secs}s")]
    TimedOut { tool: String, secs: u64 },

    /// The blocking task running the backend panicked.
    #[error("strategy task panicked: {detail}")]
    Panicked { detail: String },
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    /// The page's embedded text layer could not be decoded.
    #[error("Page {page}: text layer extraction failed: {detail}")]
    TextLayerFailed { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// OCR failed with both the tuned and the default profile.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::TextLayerFailed { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::OcrFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let e = ExtractError::FileNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("missing.pdf"), "got: {msg}");
        assert!(msg.contains("not found"), "got: {msg}");
    }

    #[test]
    fn exhausted_display() {
        let e = ExtractError::Exhausted {
            path: PathBuf::from("cv.pdf"),
            attempted: 3,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Could not extract text from PDF"), "got: {msg}");
        assert!(msg.contains("3 strategies"));
    }

    #[test]
    fn timed_out_display() {
        let e = StrategyError::TimedOut {
            tool: "pdftotext".into(),
            secs: 30,
        };
        assert_eq!(e.to_string(), "pdftotext timed out after 30s");
    }

    #[test]
    fn unavailable_names_capability() {
        let e = StrategyError::Unavailable {
            capability: Capability::OcrEngine,
        };
        assert!(e.to_string().contains("OCR engine"));
    }

    #[test]
    fn page_error_page_number() {
        let e = PageError::OcrFailed {
            page: 4,
            detail: "boom".into(),
        };
        assert_eq!(e.page(), 4);
        assert!(e.to_string().starts_with("Page 4"));
    }

    #[test]
    fn strategy_error_serialises_with_kind_tag() {
        let e = StrategyError::ToolFailed {
            tool: "tesseract".into(),
            status: Some(1),
            stderr: "bad image".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "tool_failed");
        assert_eq!(json["tool"], "tesseract");
    }
}
