//! Web front end for pdf2latex: upload a PDF, pick DPI and output format,
//! download the results.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2latex::server::{
    serve, ServerConfig, DEFAULT_BIND, DEFAULT_BODY_LIMIT, DEFAULT_JOB_RETENTION,
};
use pdf2latex::ConversionConfig;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Serve the PDF → LaTeX upload UI.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2latex-server",
    version,
    about = "Serve the PDF → LaTeX → PDF/Word upload UI",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "PDF2LATEX_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// Directory holding one subdirectory per conversion job.
    #[arg(long, env = "PDF2LATEX_JOBS_DIR")]
    jobs_dir: Option<PathBuf>,

    /// Maximum upload size in MiB.
    #[arg(long, env = "PDF2LATEX_MAX_UPLOAD_MB", default_value_t = DEFAULT_BODY_LIMIT / (1024 * 1024))]
    max_upload_mb: usize,

    /// Hours a finished job's files stay downloadable.
    #[arg(long, env = "PDF2LATEX_JOB_RETENTION_HOURS", default_value_t = DEFAULT_JOB_RETENTION.as_secs() / 3600)]
    job_retention_hours: u64,

    /// Pages fixed concurrently per job.
    #[arg(long, env = "PDF2LATEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Skip Tesseract orientation detection.
    #[arg(long, env = "PDF2LATEX_NO_ORIENT")]
    no_orient: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2LATEX_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let jobs_dir = cli
        .jobs_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("pdf2latex-jobs"));

    let base = ConversionConfig::builder()
        .concurrency(cli.concurrency)
        .detect_orientation(!cli.no_orient)
        .build()
        .context("Invalid configuration")?;

    serve(ServerConfig {
        bind: cli.bind,
        jobs_dir,
        body_limit: cli.max_upload_mb.saturating_mul(1024 * 1024),
        job_retention: Duration::from_secs(cli.job_retention_hours.saturating_mul(3600)),
        base,
    })
    .await
    .context("Server failed")
}
