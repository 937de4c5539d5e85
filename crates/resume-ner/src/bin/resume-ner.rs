//! resume-ner: serve the entity model over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use resume_ner::{serve, ServiceConfig, ServiceContext};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Tag resume entities over HTTP (`POST /parse-resume`).
#[derive(Parser, Debug)]
#[command(name = "resume-ner", version, about)]
struct Cli {
    /// Interface to bind.
    #[arg(long, env = "RESUME_NER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "RESUME_NER_PORT", default_value_t = 5000)]
    port: u16,

    /// Directory containing model.json.
    #[arg(long, env = "RESUME_NER_MODEL", default_value = "resume_ner_model")]
    model_dir: PathBuf,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for ServiceConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            model_dir: cli.model_dir,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" })),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli.into()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServiceConfig) -> Result<()> {
    let ctx = ServiceContext::load(&config.model_dir).context("Failed to load entity model")?;
    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    serve(listener, ctx).await.context("Server error")
}
