//! Configuration types for the extraction cascade.
//!
//! All cascade behaviour is controlled through [`CascadeConfig`], built via
//! its [`CascadeConfigBuilder`]. The length thresholds are defaults observed
//! to work on typical one-to-three page resumes; they are knobs, not derived
//! constants.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Printable ASCII plus the punctuation that shows up in resumes.
pub const DEFAULT_CHAR_WHITELIST: &str = concat!(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz",
    "0123456789",
    " .,;:!?@#$%&*()-_+=/\\'\"[]{}<>|~^`",
);

/// Configuration for one cascade run.
///
/// Built via [`CascadeConfig::builder()`] or using
/// [`CascadeConfig::default()`].
///
/// # Example
/// ```rust
/// use resume_text::CascadeConfig;
///
/// let config = CascadeConfig::builder()
///     .substantial_chars(200)
///     .ocr_zoom(3.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.substantial_chars, 200);
/// ```
#[derive(Clone)]
pub struct CascadeConfig {
    /// Text-layer output longer than this is accepted outright and OCR is
    /// skipped. Default: 100.
    pub substantial_chars: usize,

    /// Text-layer output at least this long counts as "minimal but present"
    /// and is accepted on its own when OCR yields nothing. Default: 20.
    pub minimal_chars: usize,

    /// OCR output longer than this is accepted when the text layer was empty.
    /// Default: 50.
    pub ocr_accept_chars: usize,

    /// When both text layer and OCR produced text, the longer one wins if it
    /// exceeds the other by more than this factor; otherwise both are
    /// concatenated. Default: 1.5.
    pub length_ratio: f64,

    /// Scale factor applied to the rasteriser's 72-dpi default before OCR.
    /// Range: 0.5–8.0. Default: 2.0.
    pub ocr_zoom: f32,

    /// Convert rendered pages to grayscale before OCR. Default: true.
    pub ocr_grayscale: bool,

    /// OCR language hint (tesseract traineddata name). Default: "eng".
    pub ocr_language: String,

    /// Profile used for the first OCR attempt on each page. A failing page is
    /// retried once with [`OcrProfile::untuned`]. Default: [`OcrProfile::tuned`].
    pub ocr_profile: OcrProfile,

    /// Time budget for the external command-line extractor. Default: 30 s.
    pub external_timeout_secs: u64,

    /// Narrowest encoding the final text must survive. Default: UTF-8.
    pub output_encoding: OutputEncoding,

    /// Which strategies may run at all, on top of capability availability.
    pub strategies: StrategyToggles,

    /// Receives per-strategy and per-page events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            substantial_chars: 100,
            minimal_chars: 20,
            ocr_accept_chars: 50,
            length_ratio: 1.5,
            ocr_zoom: 2.0,
            ocr_grayscale: true,
            ocr_language: "eng".to_string(),
            ocr_profile: OcrProfile::tuned(),
            external_timeout_secs: 30,
            output_encoding: OutputEncoding::default(),
            strategies: StrategyToggles::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CascadeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeConfig")
            .field("substantial_chars", &self.substantial_chars)
            .field("minimal_chars", &self.minimal_chars)
            .field("ocr_accept_chars", &self.ocr_accept_chars)
            .field("length_ratio", &self.length_ratio)
            .field("ocr_zoom", &self.ocr_zoom)
            .field("ocr_grayscale", &self.ocr_grayscale)
            .field("ocr_language", &self.ocr_language)
            .field("ocr_profile", &self.ocr_profile)
            .field("external_timeout_secs", &self.external_timeout_secs)
            .field("output_encoding", &self.output_encoding)
            .field("strategies", &self.strategies)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn CascadeProgressCallback>"),
            )
            .finish()
    }
}

impl CascadeConfig {
    /// Create a new builder for `CascadeConfig`.
    pub fn builder() -> CascadeConfigBuilder {
        CascadeConfigBuilder {
            config: Self::default(),
        }
    }

    /// The external-tool time budget as a [`Duration`].
    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }
}

/// Builder for [`CascadeConfig`].
#[derive(Debug)]
pub struct CascadeConfigBuilder {
    config: CascadeConfig,
}

impl CascadeConfigBuilder {
    pub fn substantial_chars(mut self, n: usize) -> Self {
        self.config.substantial_chars = n;
        self
    }

    pub fn minimal_chars(mut self, n: usize) -> Self {
        self.config.minimal_chars = n;
        self
    }

    pub fn ocr_accept_chars(mut self, n: usize) -> Self {
        self.config.ocr_accept_chars = n;
        self
    }

    pub fn length_ratio(mut self, ratio: f64) -> Self {
        self.config.length_ratio = ratio;
        self
    }

    pub fn ocr_zoom(mut self, zoom: f32) -> Self {
        self.config.ocr_zoom = zoom.clamp(0.5, 8.0);
        self
    }

    pub fn ocr_grayscale(mut self, v: bool) -> Self {
        self.config.ocr_grayscale = v;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn ocr_profile(mut self, profile: OcrProfile) -> Self {
        self.config.ocr_profile = profile;
        self
    }

    pub fn external_timeout_secs(mut self, secs: u64) -> Self {
        self.config.external_timeout_secs = secs.max(1);
        self
    }

    pub fn output_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.config.output_encoding = encoding;
        self
    }

    pub fn strategies(mut self, toggles: StrategyToggles) -> Self {
        self.config.strategies = toggles;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CascadeConfig, ExtractError> {
        let c = &self.config;
        if c.minimal_chars > c.substantial_chars {
            return Err(ExtractError::InvalidConfig(format!(
                "minimal_chars ({}) must not exceed substantial_chars ({})",
                c.minimal_chars, c.substantial_chars
            )));
        }
        if !c.length_ratio.is_finite() || c.length_ratio < 1.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "length_ratio must be ≥ 1.0, got {}",
                c.length_ratio
            )));
        }
        if !(0.5..=8.0).contains(&c.ocr_zoom) {
            return Err(ExtractError::InvalidConfig(format!(
                "ocr_zoom must be 0.5–8.0, got {}",
                c.ocr_zoom
            )));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "ocr_language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums & small types ──────────────────────────────────────────────────

/// Encoding the emitted text is guaranteed to be representable in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEncoding {
    /// Any valid UTF-8 (default). Known problem punctuation is still
    /// normalised.
    #[default]
    Utf8,
    /// 7-bit ASCII. Characters with no ASCII equivalent are dropped.
    Ascii,
}

/// Per-run switches that disable a strategy even when its capability exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyToggles {
    pub text_layer: bool,
    pub ocr: bool,
    pub external: bool,
}

impl Default for StrategyToggles {
    fn default() -> Self {
        Self {
            text_layer: true,
            ocr: true,
            external: true,
        }
    }
}

/// OCR engine settings for one recognition call.
///
/// Rendered as a tesseract-style configuration string by its `Display`
/// impl and as an argument vector by [`OcrProfile::to_args`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OcrProfile {
    /// `--oem`: OCR engine mode.
    pub engine_mode: Option<u8>,
    /// `--psm`: page segmentation mode.
    pub page_segmentation: Option<u8>,
    /// `tessedit_char_whitelist`.
    pub char_whitelist: Option<String>,
}

impl OcrProfile {
    /// LSTM engine, single uniform text block, printable-ASCII whitelist.
    pub fn tuned() -> Self {
        Self {
            engine_mode: Some(3),
            page_segmentation: Some(6),
            char_whitelist: Some(DEFAULT_CHAR_WHITELIST.to_string()),
        }
    }

    /// The engine's own defaults.
    pub fn untuned() -> Self {
        Self::default()
    }

    pub fn is_untuned(&self) -> bool {
        self == &Self::untuned()
    }

    /// Command-line arguments for the tesseract CLI.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(oem) = self.engine_mode {
            args.push("--oem".to_string());
            args.push(oem.to_string());
        }
        if let Some(psm) = self.page_segmentation {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        if let Some(ref whitelist) = self.char_whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={whitelist}"));
        }
        args
    }
}

impl fmt::Display for OcrProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_untuned() {
            return f.write_str("<default>");
        }
        f.write_str(&self.to_args().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = CascadeConfig::default();
        assert_eq!(c.substantial_chars, 100);
        assert_eq!(c.minimal_chars, 20);
        assert_eq!(c.ocr_accept_chars, 50);
        assert_eq!(c.length_ratio, 1.5);
        assert_eq!(c.external_timeout(), Duration::from_secs(30));
        assert_eq!(c.output_encoding, OutputEncoding::Utf8);
        assert!(c.ocr_grayscale);
    }

    #[test]
    fn builder_rejects_inverted_thresholds() {
        let err = CascadeConfig::builder()
            .minimal_chars(150)
            .substantial_chars(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("minimal_chars"));
    }

    #[test]
    fn builder_rejects_ratio_below_one() {
        assert!(CascadeConfig::builder().length_ratio(0.9).build().is_err());
        assert!(CascadeConfig::builder().length_ratio(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_clamps_zoom_and_timeout() {
        let c = CascadeConfig::builder()
            .ocr_zoom(40.0)
            .external_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.ocr_zoom, 8.0);
        assert_eq!(c.external_timeout_secs, 1);
    }

    #[test]
    fn builder_rejects_blank_language() {
        assert!(CascadeConfig::builder().ocr_language("  ").build().is_err());
    }

    #[test]
    fn tuned_profile_args() {
        let args = OcrProfile::tuned().to_args();
        assert_eq!(&args[..4], ["--oem", "3", "--psm", "6"]);
        assert_eq!(args[4], "-c");
        assert!(args[5].starts_with("tessedit_char_whitelist=ABC"));
    }

    #[test]
    fn untuned_profile_has_no_args() {
        let p = OcrProfile::untuned();
        assert!(p.is_untuned());
        assert!(p.to_args().is_empty());
        assert_eq!(p.to_string(), "<default>");
    }

    #[test]
    fn whitelist_is_printable_ascii() {
        assert!(DEFAULT_CHAR_WHITELIST
            .chars()
            .all(|c| c.is_ascii() && !c.is_ascii_control()));
    }
}
