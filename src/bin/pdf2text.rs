//! CLI binary for resume-text.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CascadeConfig`, runs the cascade and prints the text.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use resume_text::{
    Cascade, CascadeConfig, CascadeProgressCallback, CapabilityRegistry, OutputEncoding,
    ProgressCallback, Selection, Strategy, StrategyToggles,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr showing the running strategy and page.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Opening");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl CascadeProgressCallback for CliProgressCallback {
    fn on_strategy_start(&self, strategy: Strategy) {
        self.bar.set_prefix(strategy.to_string());
        self.bar.set_message("");
    }

    fn on_page_complete(&self, _: Strategy, page_num: usize, total_pages: usize, chars: usize) {
        self.bar
            .set_message(format!("page {page_num}/{total_pages}  {}", dim(&format!("{chars} chars"))));
    }

    fn on_page_error(&self, _: Strategy, page_num: usize, total_pages: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg)
        ));
    }

    fn on_strategy_complete(&self, strategy: Strategy, chars: usize) {
        let mark = if chars > 0 { green("✓") } else { dim("·") };
        self.bar
            .println(format!("  {mark} {:<10} {}", strategy.to_string(), dim(&format!("{chars} chars"))));
    }

    fn on_selection(&self, _: Selection, _: usize) {
        self.clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print a resume's text
  pdf2text resume.pdf

  # Write to a file, ASCII only
  pdf2text --encoding ascii resume.pdf -o resume.txt

  # Full result with every strategy attempt
  pdf2text --json resume.pdf > result.json

  # What can this machine do?
  pdf2text --check-deps

STRATEGIES (in order):
  text layer   embedded text via lopdf
  OCR          pdfium rendering + tesseract, when the text layer is thin
  external     pdftotext, then the built-in pdf-extract

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   libpdfium file or directory
  TESSERACT_CMD     tesseract executable (default: found on PATH)
  PDFTOTEXT_CMD     pdftotext executable (default: found on PATH)
  RUST_LOG          log filter, overrides -v / -q
"#;

/// Extract plain text from a PDF resume.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2text",
    version,
    about = "Extract plain text from a PDF using text layer, OCR and external-tool fallbacks",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file path.
    #[arg(value_name = "PDF_FILE_PATH", required_unless_present = "check_deps")]
    input: Option<PathBuf>,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "PDF2TEXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the full extraction (selection, attempts, timings) as JSON.
    #[arg(long, env = "PDF2TEXT_JSON")]
    json: bool,

    /// Encoding the output text must fit in.
    #[arg(long, env = "PDF2TEXT_ENCODING", value_enum, default_value = "utf8")]
    encoding: EncodingArg,

    /// Text-layer length above which OCR is skipped.
    #[arg(long, env = "PDF2TEXT_SUBSTANTIAL_CHARS", default_value_t = 100)]
    substantial_chars: usize,

    /// Text-layer length accepted on its own when OCR finds nothing.
    #[arg(long, env = "PDF2TEXT_MINIMAL_CHARS", default_value_t = 20)]
    minimal_chars: usize,

    /// OCR length accepted when there is no text layer.
    #[arg(long, env = "PDF2TEXT_OCR_ACCEPT_CHARS", default_value_t = 50)]
    ocr_accept_chars: usize,

    /// Length factor by which one result must exceed the other to win outright.
    #[arg(long, env = "PDF2TEXT_LENGTH_RATIO", default_value_t = 1.5)]
    length_ratio: f64,

    /// Render zoom for OCR (0.5–8.0, relative to 72 dpi).
    #[arg(long, env = "PDF2TEXT_OCR_ZOOM", default_value_t = 2.0)]
    ocr_zoom: f32,

    /// OCR language (tesseract traineddata name).
    #[arg(long, env = "PDF2TEXT_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Keep colour when rendering pages for OCR (default: grayscale).
    #[arg(long, env = "PDF2TEXT_OCR_COLOR")]
    ocr_color: bool,

    /// Seconds before the external tool is killed.
    #[arg(long, env = "PDF2TEXT_EXTERNAL_TIMEOUT", default_value_t = 30)]
    external_timeout: u64,

    /// Skip the embedded text layer.
    #[arg(long, env = "PDF2TEXT_NO_TEXT_LAYER")]
    no_text_layer: bool,

    /// Skip OCR.
    #[arg(long, env = "PDF2TEXT_NO_OCR")]
    no_ocr: bool,

    /// Skip the external tool and library fallback.
    #[arg(long, env = "PDF2TEXT_NO_EXTERNAL")]
    no_external: bool,

    /// Report which extraction backends are available, then exit.
    #[arg(long)]
    check_deps: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2TEXT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EncodingArg {
    Utf8,
    Ascii,
}

impl From<EncodingArg> for OutputEncoding {
    fn from(v: EncodingArg) -> Self {
        match v {
            EncodingArg::Utf8 => OutputEncoding::Utf8,
            EncodingArg::Ascii => OutputEncoding::Ascii,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage problems exit 1 like every other failure; help/version exit 0.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose && !cli.check_deps;
    init_logging(&cli, show_progress);

    match run(cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise debug with `-v`, error with `-q`, warn while
/// the spinner is shown, info otherwise.
fn init_logging(cli: &Cli, show_progress: bool) {
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    // ── Dependency report ────────────────────────────────────────────────
    if cli.check_deps {
        let report = CapabilityRegistry::probe().report();
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            print!("{report}");
            if !report.any_strategy() {
                println!("\nNo extraction strategy is available.");
            }
        }
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        anyhow::bail!("Usage: pdf2text <pdf-file-path>");
    };

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner
        .as_ref()
        .map(|cb| Arc::clone(cb) as ProgressCallback);
    let config = build_config(&cli, progress)?;
    let cascade = Cascade::probe(config);

    // ── Run extraction ───────────────────────────────────────────────────
    let result = match cli.output {
        Some(ref output_path) => cascade.extract_to_file(&input, output_path).await,
        None => cascade.extract(&input).await,
    };
    if let Some(ref cb) = spinner {
        cb.clear();
    }
    let extraction = result?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&extraction).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(extraction.text.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .and_then(|_| handle.flush())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet && (show_progress || cli.output.is_some()) {
        let dest = cli
            .output
            .as_ref()
            .map(|p| format!("  →  {}", p.display()))
            .unwrap_or_default();
        eprintln!(
            "{} {}  {}  {}ms{}",
            green("✔"),
            extraction.selection,
            dim(&format!("{} chars", extraction.text.chars().count())),
            extraction.duration_ms,
            dest
        );
    }

    Ok(())
}

/// Map CLI args to `CascadeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CascadeConfig> {
    let mut builder = CascadeConfig::builder()
        .substantial_chars(cli.substantial_chars)
        .minimal_chars(cli.minimal_chars)
        .ocr_accept_chars(cli.ocr_accept_chars)
        .length_ratio(cli.length_ratio)
        .ocr_zoom(cli.ocr_zoom)
        .ocr_grayscale(!cli.ocr_color)
        .ocr_language(cli.ocr_lang.clone())
        .external_timeout_secs(cli.external_timeout)
        .output_encoding(cli.encoding.into())
        .strategies(StrategyToggles {
            text_layer: !cli.no_text_layer,
            ocr: !cli.no_ocr,
            external: !cli.no_external,
        });

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Failed to build configuration")
}
