//! CLI binary for pdf2latex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2latex::{
    check_toolchain, convert, inspect, ConversionConfig, ConversionProgressCallback,
    OutputFormat, PageSelection, ProgressCallback, Stage, ToolPaths,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner per stage and a page bar while pages are
/// being fixed. Pages finish out of order when fixing runs concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the running stage.
    stage_started: Mutex<Option<(Stage, Instant)>>,
    warnings: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(spinner_style());
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
            warnings: AtomicUsize::new(0),
        })
    }

    fn finish_stage(&self) {
        let finished = self.stage_started.lock().ok().and_then(|mut s| s.take());
        if let Some((stage, started)) = finished {
            self.bar.println(format!(
                "  {} {:<32} {}",
                green("✓"),
                stage.label(),
                dim(&format!("{:.1}s", started.elapsed().as_secs_f64())),
            ));
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

fn page_bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  \
         [{bar:42.green/238}] {pos:>3}/{len} pages  \
         ⏱ {elapsed_precise}  ETA {eta_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(TICKS)
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut s) = self.stage_started.lock() {
            *s = Some((stage, Instant::now()));
        }
        if stage == Stage::FixPages {
            self.bar.set_position(0);
            self.bar.set_style(page_bar_style());
            self.bar.reset_eta();
        } else {
            self.bar.set_style(spinner_style());
        }
        self.bar.set_prefix(stage.label());
        self.bar.set_message("");
    }

    fn on_stage_complete(&self, _stage: Stage) {
        self.finish_stage();
    }

    fn on_page_fixed(&self, page_num: usize, _total: usize, rotation: u16) {
        if rotation != 0 {
            self.bar.println(format!(
                "    {} page {page_num} rotated {rotation}°",
                dim("↻")
            ));
        }
        self.bar.inc(1);
    }

    fn on_page_warning(&self, page_num: usize, warning: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);

        // Truncate very long messages to keep output tidy.
        let msg: String = if warning.chars().count() > 80 {
            let head: String = warning.chars().take(79).collect();
            format!("{head}\u{2026}")
        } else {
            warning.to_string()
        };
        self.bar.println(format!(
            "    {} page {page_num}: {}",
            yellow("⚠"),
            yellow(&msg)
        ));
    }

    fn on_conversion_complete(&self, total_pages: usize, outputs: usize) {
        self.finish_stage();
        self.bar.finish_and_clear();

        let warnings = self.warnings.load(Ordering::SeqCst);
        eprintln!(
            "{} {} pages converted, {} compiled document(s){}",
            if warnings == 0 { green("✔") } else { cyan("⚠") },
            bold(&total_pages.to_string()),
            outputs,
            if warnings == 0 {
                String::new()
            } else {
                format!("  ({warnings} warnings)")
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a scanned exam to LaTeX and PDF
  pdf2latex exam.pdf -o out/

  # Word output at a higher scan resolution
  pdf2latex --format docx --dpi 400 exam.pdf -o out/

  # Both outputs, first three pages only
  pdf2latex --format both --pages 1-3 exam.pdf -o out/

  # Already upright scans: skip orientation detection
  pdf2latex --no-orient exam.pdf -o out/

  # Inspect PDF metadata (no credentials needed)
  pdf2latex --inspect-only exam.pdf

  # Check that pdflatex, pandoc, tesseract & co. are installed
  pdf2latex --check-tools

  # JSON summary of the run
  pdf2latex --json exam.pdf -o out/ > run.json

OUTPUT DIRECTORY:
  images/page_N_processed.png   fixed pages
  corrected.pdf                 fixed pages as one PDF
  analysis.json                 layout analysis result
  figures/figure_P_I.png        cropped figures
  output.txt                    reading-order text with [FIGURE: …] markers
  paper_itl_final.tex           generated LaTeX (see --stem)
  paper_itl_final.pdf / .docx   compiled documents

ENVIRONMENT VARIABLES:
  DOC_INTELLIGENCE_ENDPOINT     Layout-analysis service endpoint (required)
  DOC_INTELLIGENCE_KEY          Layout-analysis service key (required)
  DOC_INTELLIGENCE_API_VERSION  Override the layout API version
  AZURE_ENDPOINT                Azure OpenAI resource endpoint (required for azure)
  OPENAI_API_KEY                Azure OpenAI key (required for azure)
  OPENAI_API_VERSION            Azure OpenAI API version (required for azure)
  AZURE_MODEL_NAME              LLM model / deployment (default: gpt-4o-mini)
  PDF2LATEX_LLM_PROVIDER        LLM provider (default: azure)
  PDFIUM_LIB_PATH               Directory or file of an existing libpdfium
  RUST_LOG                      Tracing filter, e.g. pdf2latex=debug

SETUP:
  1. Install pdflatex (TeX Live), pandoc and tesseract-ocr.
  2. Export the layout and LLM credentials.
  3. Convert:  pdf2latex exam.pdf -o out/
"#;

/// Convert scanned PDF exam papers to LaTeX, PDF and Word.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2latex",
    version,
    about = "Convert scanned PDF exam papers to LaTeX, PDF and Word",
    long_about = "Straighten and trim every scanned page, analyse the layout with a cloud \
layout model, extract figures, and let an LLM rewrite the text as structured LaTeX. \
The LaTeX is then compiled with pdflatex and/or converted to Word with pandoc.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "check_tools")]
    input: Option<String>,

    /// Directory for all outputs. Default: a new temp directory that is kept.
    #[arg(short, long, env = "PDF2LATEX_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Compiled output: pdf, docx or both.
    #[arg(short, long, env = "PDF2LATEX_FORMAT", value_enum, default_value = "pdf")]
    format: FormatArg,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF2LATEX_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2LATEX_PAGES", default_value = "all")]
    pages: String,

    /// LLM model / deployment name.
    #[arg(long, env = "AZURE_MODEL_NAME")]
    model: Option<String>,

    /// LLM provider (azure, openai, anthropic, gemini, ollama, …).
    #[arg(long, env = "PDF2LATEX_LLM_PROVIDER")]
    provider: Option<String>,

    /// Skip Tesseract orientation detection.
    #[arg(long, env = "PDF2LATEX_NO_ORIENT")]
    no_orient: bool,

    /// Padding kept around content when cropping, in pixels.
    #[arg(long, env = "PDF2LATEX_PAD", default_value_t = 20)]
    pad: u32,

    /// Pixels brighter than this count as background when cropping.
    #[arg(long, env = "PDF2LATEX_WHITE_THRESHOLD", default_value_t = 245,
          value_parser = clap::value_parser!(u8).range(1..=255))]
    white_threshold: u8,

    /// File stem of the .tex/.pdf/.docx outputs.
    #[arg(long, env = "PDF2LATEX_STEM", default_value = "paper_itl_final")]
    stem: String,

    /// Pages fixed concurrently.
    #[arg(short, long, env = "PDF2LATEX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2LATEX_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2LATEX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "PDF2LATEX_MAX_TOKENS", default_value_t = 7000)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2LATEX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, env = "PDF2LATEX_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// tesseract executable.
    #[arg(long, env = "PDF2LATEX_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// pdflatex executable.
    #[arg(long, env = "PDF2LATEX_PDFLATEX", default_value = "pdflatex")]
    pdflatex: String,

    /// pandoc executable.
    #[arg(long, env = "PDF2LATEX_PANDOC", default_value = "pandoc")]
    pandoc: String,

    /// Print a JSON summary (ConversionOutput) instead of the path list.
    #[arg(long, env = "PDF2LATEX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2LATEX_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Report which external programs are installed, then exit.
    #[arg(long)]
    check_tools: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2LATEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2LATEX_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2LATEX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, env = "PDF2LATEX_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Pdf,
    Docx,
    Both,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Docx => OutputFormat::Docx,
            FormatArg::Both => OutputFormat::Both,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Toolchain check ──────────────────────────────────────────────────
    if cli.check_tools {
        let report = check_toolchain();
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            for tool in &report.tools {
                match &tool.path {
                    Some(p) => println!(
                        "{} {:<10} {}",
                        green("✓"),
                        tool.name,
                        dim(&p.display().to_string())
                    ),
                    None => println!("{} {:<10} {}", red("✗"), tool.name, red("not found")),
                }
            }
        }
        if !report.is_complete() {
            anyhow::bail!("Missing tools: {}", report.missing().join(", "));
        }
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .context("An input PDF path or URL is required")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&input, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    println!("{}", output.tex_path.display());
    if let Some(ref p) = output.pdf_path {
        println!("{}", p.display());
    }
    if let Some(ref p) = output.docx_path {
        println!("{}", p.display());
    }

    if !cli.quiet {
        for e in &output.compile_errors {
            eprintln!("{} {}", red("✗"), e);
        }
        eprintln!(
            "   {} pages  /  {} figures  /  {} tokens in  /  {} tokens out  —  {}ms total",
            output.stats.processed_pages,
            output.stats.figures,
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
        eprintln!("   outputs in {}", bold(&output.work_dir.display().to_string()));
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let pages = parse_pages(&cli.pages)?;

    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .pad_px(cli.pad)
        .white_threshold(cli.white_threshold)
        .detect_orientation(!cli.no_orient)
        .concurrency(cli.concurrency)
        .output_format(cli.format.into())
        .tex_stem(cli.stem.clone())
        .pages(pages)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .tools(ToolPaths {
            tesseract: cli.tesseract.clone(),
            pdflatex: cli.pdflatex.clone(),
            pandoc: cli.pandoc.clone(),
        })
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref dir) = cli.output {
        builder = builder.work_dir(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
