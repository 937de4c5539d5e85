//! Length-based selection between candidate texts.
//!
//! Everything here is a pure function of text lengths and
//! [`CascadeConfig`] thresholds; the cascade feeds it attempt results and
//! acts on the returned [`Decision`].

use crate::config::CascadeConfig;

/// Unicode scalar count of the trimmed text.
pub fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// How much the embedded text layer yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayerClass {
    /// More than `substantial_chars`; accepted without OCR.
    Substantial,
    /// `minimal_chars..=substantial_chars`; accepted alone if OCR finds nothing.
    Minimal,
    /// Fewer than `minimal_chars` but not empty.
    Trivial,
    Empty,
}

pub fn classify_text_layer(len: usize, config: &CascadeConfig) -> TextLayerClass {
    if len > config.substantial_chars {
        TextLayerClass::Substantial
    } else if len >= config.minimal_chars {
        TextLayerClass::Minimal
    } else if len > 0 {
        TextLayerClass::Trivial
    } else {
        TextLayerClass::Empty
    }
}

/// Outcome of weighing text-layer output against OCR output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    UseTextLayer,
    UseOcr,
    /// Text layer, blank line, OCR.
    Combine,
    /// Neither candidate is good enough on its own; try the external
    /// strategy.
    Undecided,
}

/// Decide between a non-substantial text layer and the OCR result.
///
/// Lengths are [`char_len`] values.
pub fn decide(text_layer: usize, ocr: usize, config: &CascadeConfig) -> Decision {
    match (text_layer, ocr) {
        (0, 0) => Decision::Undecided,
        (0, o) if o > config.ocr_accept_chars => Decision::UseOcr,
        (0, _) => Decision::Undecided,
        (t, 0) if t >= config.minimal_chars => Decision::UseTextLayer,
        (_, 0) => Decision::Undecided,
        (t, o) => {
            let (t, o) = (t as f64, o as f64);
            if t > config.length_ratio * o {
                Decision::UseTextLayer
            } else if o > config.length_ratio * t {
                Decision::UseOcr
            } else {
                Decision::Combine
            }
        }
    }
}

/// Concatenate both candidates, separated by a blank line.
pub fn combine(text_layer: &str, ocr: &str) -> String {
    format!("{}\n\n{}", text_layer.trim(), ocr.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CascadeConfig {
        CascadeConfig::default()
    }

    #[test]
    fn char_len_counts_scalars_after_trim() {
        assert_eq!(char_len("  José \n"), 4);
        assert_eq!(char_len(""), 0);
        assert_eq!(char_len(" \n\t "), 0);
    }

    #[test]
    fn classify_boundaries() {
        let c = cfg();
        assert_eq!(classify_text_layer(101, &c), TextLayerClass::Substantial);
        assert_eq!(classify_text_layer(100, &c), TextLayerClass::Minimal);
        assert_eq!(classify_text_layer(20, &c), TextLayerClass::Minimal);
        assert_eq!(classify_text_layer(19, &c), TextLayerClass::Trivial);
        assert_eq!(classify_text_layer(1, &c), TextLayerClass::Trivial);
        assert_eq!(classify_text_layer(0, &c), TextLayerClass::Empty);
    }

    #[test]
    fn empty_text_layer_needs_enough_ocr() {
        let c = cfg();
        assert_eq!(decide(0, 51, &c), Decision::UseOcr);
        assert_eq!(decide(0, 50, &c), Decision::Undecided);
        assert_eq!(decide(0, 0, &c), Decision::Undecided);
    }

    #[test]
    fn minimal_text_layer_alone_when_ocr_empty() {
        let c = cfg();
        assert_eq!(decide(20, 0, &c), Decision::UseTextLayer);
        assert_eq!(decide(19, 0, &c), Decision::Undecided);
    }

    #[test]
    fn ratio_picks_the_longer() {
        let c = cfg();
        assert_eq!(decide(40, 61, &c), Decision::UseOcr);
        assert_eq!(decide(40, 60, &c), Decision::Combine);
        assert_eq!(decide(91, 60, &c), Decision::UseTextLayer);
        assert_eq!(decide(90, 60, &c), Decision::Combine);
    }

    #[test]
    fn trivial_text_layer_still_combines_with_short_ocr() {
        assert_eq!(decide(5, 6, &cfg()), Decision::Combine);
    }

    #[test]
    fn combine_uses_blank_line() {
        assert_eq!(combine(" Jane Doe \n", "\nRust engineer "), "Jane Doe\n\nRust engineer");
    }
}
