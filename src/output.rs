//! Output types produced by the cascade.

use crate::error::{PageError, StrategyError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One way of getting text out of a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// The document's embedded text layer.
    TextLayer,
    /// OCR over rasterised pages.
    Ocr,
    /// Command-line tool, then the in-process library extractor.
    External,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::TextLayer => "text layer",
            Strategy::Ocr => "OCR",
            Strategy::External => "external",
        })
    }
}

/// Which branch of the selection policy produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "branch", content = "strategy", rename_all = "snake_case")]
pub enum Selection {
    TextLayer,
    Ocr,
    /// Text layer and OCR concatenated with a blank line between them.
    Combined,
    External,
    /// A short leftover candidate accepted after every other branch failed.
    BestEffort(Strategy),
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::TextLayer => f.write_str("text layer"),
            Selection::Ocr => f.write_str("OCR"),
            Selection::Combined => f.write_str("text layer + OCR"),
            Selection::External => f.write_str("external"),
            Selection::BestEffort(s) => write!(f, "best effort ({s})"),
        }
    }
}

/// The result of running one strategy against one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub strategy: Strategy,

    /// Sanitised text; empty when the strategy failed or found nothing.
    pub text: String,

    /// Unicode scalar count of the trimmed text.
    pub chars: usize,

    /// Pages seen by the strategy (0 when it did not get that far or does
    /// not report pages).
    pub pages: usize,

    /// Pages skipped inside an otherwise successful run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_errors: Vec<PageError>,

    /// Set when the strategy as a whole could not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StrategyError>,

    pub duration_ms: u64,
}

impl ExtractionAttempt {
    pub fn succeeded(
        strategy: Strategy,
        text: String,
        pages: usize,
        page_errors: Vec<PageError>,
        duration_ms: u64,
    ) -> Self {
        let chars = crate::selection::char_len(&text);
        Self {
            strategy,
            text,
            chars,
            pages,
            page_errors,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(strategy: Strategy, error: StrategyError, duration_ms: u64) -> Self {
        Self {
            strategy,
            text: String::new(),
            chars: 0,
            pages: 0,
            page_errors: Vec::new(),
            error: Some(error),
            duration_ms,
        }
    }

    /// The text, or the reason the strategy could not run.
    ///
    /// A strategy that ran but found nothing yields `Ok("")`.
    pub fn result(&self) -> Result<&str, &StrategyError> {
        match self.error {
            Some(ref e) => Err(e),
            None => Ok(&self.text),
        }
    }

    /// `true` when the strategy ran without a strategy-level error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `true` when there is no usable text, whatever the reason.
    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }
}

/// The complete result of [`crate::cascade::Cascade::extract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    /// Final text, already passed through [`crate::pipeline::postprocess::finalize`].
    pub text: String,

    pub selection: Selection,

    /// Every strategy that was considered, in the order it ran.
    pub attempts: Vec<ExtractionAttempt>,

    pub duration_ms: u64,
}

impl Extraction {
    /// The attempt recorded for `strategy`, if it was reached.
    pub fn attempt(&self, strategy: Strategy) -> Option<&ExtractionAttempt> {
        self.attempts.iter().find(|a| a.strategy == strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capability;

    #[test]
    fn succeeded_counts_trimmed_chars() {
        let a = ExtractionAttempt::succeeded(Strategy::TextLayer, "  héllo \n".into(), 1, vec![], 3);
        assert_eq!(a.chars, 5);
        assert!(a.is_success());
        assert!(!a.is_empty());
        assert_eq!(a.result(), Ok("  héllo \n"));
    }

    #[test]
    fn failed_attempt_exposes_error() {
        let err = StrategyError::Unavailable {
            capability: Capability::ExternalTool,
        };
        let a = ExtractionAttempt::failed(Strategy::External, err.clone(), 0);
        assert!(!a.is_success());
        assert!(a.is_empty());
        assert_eq!(a.result(), Err(&err));
    }

    #[test]
    fn selection_serialises_with_branch_tag() {
        let v = serde_json::to_value(Selection::BestEffort(Strategy::Ocr)).unwrap();
        assert_eq!(v["branch"], "best_effort");
        assert_eq!(v["strategy"], "ocr");

        let v = serde_json::to_value(Selection::Combined).unwrap();
        assert_eq!(v["branch"], "combined");
    }

    #[test]
    fn extraction_json_omits_empty_fields() {
        let out = Extraction {
            text: "hello".into(),
            selection: Selection::TextLayer,
            attempts: vec![ExtractionAttempt::succeeded(
                Strategy::TextLayer,
                "hello".into(),
                1,
                vec![],
                1,
            )],
            duration_ms: 1,
        };
        let v = serde_json::to_value(&out).unwrap();
        assert!(v["attempts"][0].get("error").is_none());
        assert!(v["attempts"][0].get("page_errors").is_none());
        assert!(out.attempt(Strategy::TextLayer).is_some());
        assert!(out.attempt(Strategy::Ocr).is_none());
    }
}
