//! # pdf2latex
//!
//! Convert scanned PDF exam papers into LaTeX, then into PDF and Word.
//!
//! ## Why this crate?
//!
//! Scanned papers come in crooked: pages fed sideways or upside down, wide
//! scanner margins, diagrams embedded in the text flow. Plain OCR flattens
//! all of that. Here each page is straightened and trimmed first, a cloud
//! layout model finds paragraphs and figures, and an LLM rewrites the
//! reading-order text as structured LaTeX with proper math notation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file, URL or upload
//!  ├─ 2. Render   rasterise pages via pdfium (spawn_blocking)
//!  ├─ 3. Fix      Tesseract OSD rotation + whitespace crop → corrected.pdf
//!  ├─ 4. Layout   prebuilt-layout analysis → analysis.json
//!  ├─ 5. Figures  crop figure regions → figures/*.png
//!  ├─ 6. Order    paragraphs + [FIGURE: …] markers → output.txt
//!  ├─ 7. LaTeX    LLM body + fixed preamble → <stem>.tex
//!  └─ 8. Compile  pdflatex → .pdf, pandoc → .docx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2latex::{convert, ConversionConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Layout credentials from DOC_INTELLIGENCE_ENDPOINT / DOC_INTELLIGENCE_KEY,
//!     // the Azure deployment from AZURE_ENDPOINT / OPENAI_API_KEY /
//!     // OPENAI_API_VERSION / AZURE_MODEL_NAME.
//!     let config = ConversionConfig::builder()
//!         .output_format(OutputFormat::Both)
//!         .work_dir("out")
//!         .build()?;
//!     let output = convert("exam.pdf", &config).await?;
//!     println!("{}", output.tex_path.display());
//!     for e in &output.compile_errors {
//!         eprintln!("{e}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2latex` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | Enables the `pdf2latex-server` upload UI (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! pdf2latex = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
pub mod toolchain;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AzureOpenAiConfig, ConversionConfig, ConversionConfigBuilder, LayoutServiceConfig,
    OutputFormat, PageSelection,
    ToolPaths,
};
pub use convert::{convert, convert_from_bytes, convert_sync, inspect};
pub use error::{CompileError, PageError, Pdf2LatexError};
pub use output::{
    ConversionOutput, ConversionStats, CropBox, DocumentMetadata, FigureCrop, PageResult,
};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use toolchain::{check_toolchain, ToolchainReport};
