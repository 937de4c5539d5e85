//! Strategy 2: rasterise every page and run OCR over it.
//!
//! Pages are upscaled (default 2×) and converted to grayscale before
//! recognition. Each page is first recognised with the tuned profile; a
//! failure is retried once with the engine defaults before the page is
//! skipped.

use crate::capabilities::{OcrEngine, Rasterizer};
use crate::config::{CascadeConfig, OcrProfile};
use crate::error::{PageError, StrategyError};
use crate::output::{ExtractionAttempt, Strategy};
use crate::pipeline::postprocess::{decode_lossy, join_pages, sanitize};
use crate::progress::ProgressCallback;
use crate::selection::char_len;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Environment variable overriding the tesseract executable.
pub const TESSERACT_CMD_ENV: &str = "TESSERACT_CMD";

/// Settings the blocking OCR loop needs, detached from the config.
#[derive(Debug, Clone)]
struct OcrSettings {
    zoom: f32,
    grayscale: bool,
    language: String,
    profile: OcrProfile,
}

impl From<&CascadeConfig> for OcrSettings {
    fn from(c: &CascadeConfig) -> Self {
        Self {
            zoom: c.ocr_zoom,
            grayscale: c.ocr_grayscale,
            language: c.ocr_language.clone(),
            profile: c.ocr_profile.clone(),
        }
    }
}

/// Run the OCR strategy. Never fails; problems land in the attempt.
pub async fn run(
    rasterizer: Arc<dyn Rasterizer>,
    engine: Arc<dyn OcrEngine>,
    pdf_path: &Path,
    config: &CascadeConfig,
    progress: &ProgressCallback,
) -> ExtractionAttempt {
    let start = Instant::now();
    let path = pdf_path.to_path_buf();
    let settings = OcrSettings::from(config);
    let progress = Arc::clone(progress);

    let result = tokio::task::spawn_blocking(move || {
        ocr_blocking(&*rasterizer, &*engine, &path, &settings, &progress)
    })
    .await
    .unwrap_or_else(|e| {
        Err(StrategyError::Panicked {
            detail: e.to_string(),
        })
    });

    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok((texts, total_pages, page_errors)) => {
            let attempt = ExtractionAttempt::succeeded(
                Strategy::Ocr,
                join_pages(&texts),
                total_pages,
                page_errors,
                elapsed_ms,
            );
            info!(
                "OCR: {} pages, {} chars ({} pages skipped)",
                total_pages,
                attempt.chars,
                attempt.page_errors.len()
            );
            attempt
        }
        Err(e) => {
            warn!("OCR extraction failed: {}", e);
            ExtractionAttempt::failed(Strategy::Ocr, e, elapsed_ms)
        }
    }
}

type OcrPages = (Vec<String>, usize, Vec<PageError>);

fn ocr_blocking(
    rasterizer: &dyn Rasterizer,
    engine: &dyn OcrEngine,
    path: &Path,
    settings: &OcrSettings,
    progress: &ProgressCallback,
) -> Result<OcrPages, StrategyError> {
    let mut texts = Vec::new();
    let mut page_errors = Vec::new();

    let total_pages = rasterizer.rasterize(path, settings.zoom, &mut |page_num, total, image| {
        match image.and_then(|img| recognize_page(engine, page_num, img, settings)) {
            Ok(raw) => {
                let text = sanitize(&raw);
                let chars = char_len(&text);
                debug!("OCR page {}/{}: {} chars", page_num, total, chars);
                progress.on_page_complete(Strategy::Ocr, page_num, total, chars);
                texts.push(text);
            }
            Err(e) => {
                warn!("{}", e);
                progress.on_page_error(Strategy::Ocr, page_num, total, &e.to_string());
                page_errors.push(e);
            }
        }
    })?;

    Ok((texts, total_pages, page_errors))
}

/// Recognise one page, retrying once with the untuned profile.
fn recognize_page(
    engine: &dyn OcrEngine,
    page_num: usize,
    image: DynamicImage,
    settings: &OcrSettings,
) -> Result<String, PageError> {
    let image = if settings.grayscale {
        image.grayscale()
    } else {
        image
    };

    let first = match engine.recognize(&image, &settings.language, &settings.profile) {
        Ok(text) => return Ok(text),
        Err(e) => e,
    };

    if settings.profile.is_untuned() {
        return Err(PageError::OcrFailed {
            page: page_num,
            detail: first.to_string(),
        });
    }

    warn!(
        "Page {}: OCR with profile `{}` failed ({}); retrying with engine defaults",
        page_num, settings.profile, first
    );
    engine
        .recognize(&image, &settings.language, &OcrProfile::untuned())
        .map_err(|second| PageError::OcrFailed {
            page: page_num,
            detail: format!("{first}; with engine defaults: {second}"),
        })
}

// ── tesseract backend ───────────────────────────────────────────────────────

/// OCR engine that shells out to the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
}

impl TesseractCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate tesseract via `TESSERACT_CMD` or `PATH`.
    pub fn probe() -> Result<Self, String> {
        let name = std::env::var_os(TESSERACT_CMD_ENV).unwrap_or_else(|| "tesseract".into());
        which::which(&name)
            .map(Self::new)
            .map_err(|e| format!("{}: {}", Path::new(&name).display(), e))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        profile: &OcrProfile,
    ) -> Result<String, StrategyError> {
        let tool = self.name().to_string();
        let scratch = tempfile::tempdir().map_err(|e| StrategyError::ToolFailed {
            tool: tool.clone(),
            status: None,
            stderr: format!("could not create scratch directory: {e}"),
        })?;
        let png = scratch.path().join("page.png");
        image
            .save_with_format(&png, ImageFormat::Png)
            .map_err(|e| StrategyError::ToolFailed {
                tool: tool.clone(),
                status: None,
                stderr: format!("could not write page image: {e}"),
            })?;

        let output = Command::new(&self.program)
            .arg(&png)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .args(profile.to_args())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| StrategyError::ToolMissing {
                tool: tool.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(StrategyError::ToolFailed {
                tool,
                status: output.status.code(),
                stderr: decode_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(decode_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgressCallback;
    use image::RgbImage;
    use std::sync::Mutex;

    /// Renders `pages` blank images, failing the ones listed in `broken`.
    struct BlankPages {
        pages: usize,
        broken: Vec<usize>,
    }

    impl Rasterizer for BlankPages {
        fn name(&self) -> &str {
            "blank"
        }

        fn rasterize(
            &self,
            _: &Path,
            _: f32,
            on_page: &mut dyn FnMut(usize, usize, Result<DynamicImage, PageError>),
        ) -> Result<usize, StrategyError> {
            for page in 1..=self.pages {
                let img = if self.broken.contains(&page) {
                    Err(PageError::RenderFailed {
                        page,
                        detail: "bad xobject".into(),
                    })
                } else {
                    Ok(DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
                };
                on_page(page, self.pages, img);
            }
            Ok(self.pages)
        }
    }

    /// Fails every tuned call; records the profiles it saw.
    #[derive(Default)]
    struct PickyEngine {
        seen: Mutex<Vec<OcrProfile>>,
        fail_untuned: bool,
    }

    impl OcrEngine for PickyEngine {
        fn name(&self) -> &str {
            "picky"
        }

        fn recognize(
            &self,
            image: &DynamicImage,
            _: &str,
            profile: &OcrProfile,
        ) -> Result<String, StrategyError> {
            assert!(image.as_luma8().is_some(), "page was not converted to grayscale");
            self.seen.lock().unwrap().push(profile.clone());
            if !profile.is_untuned() || self.fail_untuned {
                return Err(StrategyError::ToolFailed {
                    tool: "picky".into(),
                    status: Some(1),
                    stderr: "unsupported".into(),
                });
            }
            Ok("Recognised \u{2018}text\u{2019}".into())
        }
    }

    fn noop() -> ProgressCallback {
        Arc::new(NoopProgressCallback)
    }

    #[tokio::test]
    async fn tuned_failure_falls_back_to_defaults() {
        let engine = Arc::new(PickyEngine::default());
        let attempt = run(
            Arc::new(BlankPages { pages: 1, broken: vec![] }),
            engine.clone(),
            Path::new("scan.pdf"),
            &CascadeConfig::default(),
            &noop(),
        )
        .await;

        assert_eq!(attempt.text, "Recognised 'text'");
        let seen = engine.seen.lock().unwrap();
        assert_eq!(*seen, vec![OcrProfile::tuned(), OcrProfile::untuned()]);
    }

    #[tokio::test]
    async fn page_failures_do_not_abort_the_strategy() {
        let engine = Arc::new(PickyEngine::default());
        let attempt = run(
            Arc::new(BlankPages { pages: 3, broken: vec![2] }),
            engine,
            Path::new("scan.pdf"),
            &CascadeConfig::default(),
            &noop(),
        )
        .await;

        assert!(attempt.is_success());
        assert_eq!(attempt.pages, 3);
        assert_eq!(attempt.text, "Recognised 'text'\nRecognised 'text'");
        assert_eq!(attempt.page_errors.len(), 1);
        assert!(matches!(attempt.page_errors[0], PageError::RenderFailed { page: 2, .. }));
    }

    #[tokio::test]
    async fn both_profiles_failing_skips_the_page() {
        let engine = Arc::new(PickyEngine {
            fail_untuned: true,
            ..Default::default()
        });
        let attempt = run(
            Arc::new(BlankPages { pages: 1, broken: vec![] }),
            engine,
            Path::new("scan.pdf"),
            &CascadeConfig::default(),
            &noop(),
        )
        .await;

        assert!(attempt.is_empty());
        match &attempt.page_errors[0] {
            PageError::OcrFailed { page, detail } => {
                assert_eq!(*page, 1);
                assert!(detail.contains("with engine defaults"), "got: {detail}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_tesseract_binary_is_tool_missing() {
        let cli = TesseractCli::new("/nonexistent/tesseract");
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let err = cli.recognize(&img, "eng", &OcrProfile::tuned()).unwrap_err();
        assert!(matches!(err, StrategyError::ToolMissing { .. }), "got: {err:?}");
    }
}
