//! Strategy 3: the external command-line extractor, then the in-process
//! library extractor.
//!
//! `pdftotext` runs under a time limit and is killed when it overruns. If
//! it is missing, fails, times out or prints nothing, the library
//! extractor gets a turn. Whatever happens is recorded in the attempt; the
//! cascade decides what to do with an empty one.

use crate::capabilities::{Capability, CapabilityRegistry, DocumentExtractor};
use crate::error::StrategyError;
use crate::output::{ExtractionAttempt, Strategy};
use crate::pipeline::postprocess::{decode_lossy, join_pages, sanitize};
use crate::selection::char_len;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Environment variable overriding the pdftotext executable.
pub const PDFTOTEXT_CMD_ENV: &str = "PDFTOTEXT_CMD";

/// Form feed: pdftotext's page terminator.
const PAGE_BREAK: char = '\u{000C}';

/// Run the external strategy. Never fails; problems land in the attempt.
pub async fn run(
    capabilities: &CapabilityRegistry,
    pdf_path: &Path,
    timeout: Duration,
) -> ExtractionAttempt {
    let start = Instant::now();
    let elapsed = || start.elapsed().as_millis() as u64;

    let tool = capabilities.external_tool();
    let library = capabilities.library_fallback();
    if tool.is_none() && library.is_none() {
        return ExtractionAttempt::failed(
            Strategy::External,
            StrategyError::Unavailable {
                capability: Capability::ExternalTool,
            },
            elapsed(),
        );
    }

    // Set once any backend ran to completion, even with empty output.
    let mut ran = false;
    let mut last_error = None;

    if let Some(tool) = tool {
        match tool.run(pdf_path, timeout).await {
            Ok(raw) => {
                ran = true;
                let pages = raw.matches(PAGE_BREAK).count();
                let text = sanitize(&join_pages(&[raw.replace(PAGE_BREAK, "\n")]));
                if char_len(&text) > 0 {
                    info!("pdftotext: {} pages, {} chars", pages, char_len(&text));
                    return ExtractionAttempt::succeeded(
                        Strategy::External,
                        text,
                        pages,
                        Vec::new(),
                        elapsed(),
                    );
                }
                debug!("pdftotext produced no text");
            }
            Err(e) => {
                warn!("pdftotext failed: {}", e);
                last_error = Some(e);
            }
        }
    }

    if let Some(library) = library {
        let library = library.clone();
        let path = pdf_path.to_path_buf();
        let name = library.name().to_string();
        let result = tokio::task::spawn_blocking(move || library.extract(&path))
            .await
            .unwrap_or_else(|e| {
                Err(StrategyError::Panicked {
                    detail: e.to_string(),
                })
            });
        match result {
            Ok(raw) => {
                ran = true;
                let text = sanitize(&join_pages(&[raw]));
                if char_len(&text) > 0 {
                    info!("{}: {} chars", name, char_len(&text));
                    return ExtractionAttempt::succeeded(
                        Strategy::External,
                        text,
                        0,
                        Vec::new(),
                        elapsed(),
                    );
                }
                debug!("{} produced no text", name);
            }
            Err(e) => {
                warn!("{} failed: {}", name, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if !ran => ExtractionAttempt::failed(Strategy::External, e, elapsed()),
        _ => ExtractionAttempt::succeeded(Strategy::External, String::new(), 0, Vec::new(), elapsed()),
    }
}

// ── pdftotext ───────────────────────────────────────────────────────────────

/// `pdftotext <pdf> -`, run as a child process.
#[derive(Debug, Clone)]
pub struct PdfToTextCommand {
    program: PathBuf,
}

impl PdfToTextCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate pdftotext via `PDFTOTEXT_CMD` or `PATH`.
    pub fn probe() -> Result<Self, String> {
        let name = std::env::var_os(PDFTOTEXT_CMD_ENV).unwrap_or_else(|| "pdftotext".into());
        which::which(&name)
            .map(Self::new)
            .map_err(|e| format!("{}: {}", Path::new(&name).display(), e))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pdftotext".to_string())
    }

    /// Run the tool, returning its raw stdout.
    ///
    /// The child is killed if it is still running when `timeout` elapses.
    pub async fn run(&self, pdf_path: &Path, timeout: Duration) -> Result<String, StrategyError> {
        let tool = self.tool_name();
        let child = tokio::process::Command::new(&self.program)
            .arg(pdf_path)
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| StrategyError::ToolMissing {
                tool: tool.clone(),
                detail: e.to_string(),
            })?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Err(_) => {
                return Err(StrategyError::TimedOut {
                    tool,
                    secs: timeout.as_secs(),
                })
            }
            Ok(Err(e)) => {
                return Err(StrategyError::ToolFailed {
                    tool,
                    status: None,
                    stderr: e.to_string(),
                })
            }
            Ok(Ok(output)) => output,
        };

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

// ── pdf-extract ─────────────────────────────────────────────────────────────

/// In-process extractor backed by the `pdf-extract` crate.
#[cfg(feature = "pdf-extract-fallback")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractLibrary;

#[cfg(feature = "pdf-extract-fallback")]
impl DocumentExtractor for PdfExtractLibrary {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn extract(&self, path: &Path) -> Result<String, StrategyError> {
        pdf_extract::extract_text(path).map_err(|e| StrategyError::Unreadable {
            detail: e.to_string(),
        })
    }
}
