//! Configuration types for PDF-to-LaTeX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Layout-service credentials live in a
//! separate [`LayoutServiceConfig`] so they can be loaded from the
//! environment once and shared by every job a server runs.

use crate::error::Pdf2LatexError;
use crate::progress::ProgressCallback;
use edgequake_llm::{AzureOpenAIProvider, LLMProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Lowest accepted rendering DPI.
pub const MIN_DPI: u32 = 72;
/// Highest accepted rendering DPI.
pub const MAX_DPI: u32 = 600;

/// Configuration for a PDF-to-LaTeX conversion.
///
/// # Example
/// ```rust
/// use pdf2latex::{ConversionConfig, OutputFormat};
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .output_format(OutputFormat::Both)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI for each page. Range: 72–600. Default: 300.
    ///
    /// Higher values give the layout model more detail to work with and
    /// produce sharper figure crops; lower values process faster and keep
    /// the corrected PDF small.
    pub dpi: u32,

    /// Padding in pixels kept around the detected content box. Default: 20.
    pub pad_px: u32,

    /// Grayscale mean below which a row or column counts as content. Default: 245.
    pub white_threshold: u8,

    /// Run OCR orientation detection on every page. Default: true.
    pub detect_orientation: bool,

    /// Number of pages fixed (orientation + crop) at once. Default: 4.
    pub concurrency: usize,

    /// Which compiled outputs to produce next to the `.tex`. Default: PDF.
    pub output_format: OutputFormat,

    /// File stem of the generated `.tex`/`.pdf`/`.docx`. Default: `paper_itl_final`.
    pub tex_stem: String,

    /// Directory that receives every intermediate and final artefact.
    /// If None, a fresh `pdf2latex_*` directory is created under the system
    /// temp dir and kept after the run.
    pub work_dir: Option<PathBuf>,

    /// LLM model / deployment name. If None, uses `AZURE_MODEL_NAME` or `gpt-4o-mini`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "azure", "openai"). If None, uses
    /// `PDF2LATEX_LLM_PROVIDER` or "azure".
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Azure OpenAI resource for the `azure` provider. If None, loaded with
    /// [`AzureOpenAiConfig::from_env`] when the conversion starts.
    pub azure_openai: Option<AzureOpenAiConfig>,

    /// Sampling temperature for the LaTeX generation. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate for the document body. Default: 7000.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, uses the built-in LaTeX conversion prompt.
    pub system_prompt: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Layout-analysis service settings. If None, loaded with
    /// [`LayoutServiceConfig::from_env`] when the conversion starts.
    pub layout: Option<LayoutServiceConfig>,

    /// External program names or paths.
    pub tools: ToolPaths,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for a single LLM call in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            pad_px: 20,
            white_threshold: 245,
            detect_orientation: true,
            concurrency: 4,
            output_format: OutputFormat::default(),
            tex_stem: "paper_itl_final".to_string(),
            work_dir: None,
            model: None,
            provider_name: None,
            provider: None,
            azure_openai: None,
            temperature: 0.1,
            max_tokens: 7000,
            max_retries: 3,
            retry_backoff_ms: 500,
            password: None,
            system_prompt: None,
            pages: PageSelection::default(),
            layout: None,
            tools: ToolPaths::default(),
            download_timeout_secs: 120,
            api_timeout_secs: 300,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("pad_px", &self.pad_px)
            .field("white_threshold", &self.white_threshold)
            .field("detect_orientation", &self.detect_orientation)
            .field("concurrency", &self.concurrency)
            .field("output_format", &self.output_format)
            .field("tex_stem", &self.tex_stem)
            .field("work_dir", &self.work_dir)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("azure_openai", &self.azure_openai)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("pages", &self.pages)
            .field("layout", &self.layout)
            .field("tools", &self.tools)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(MIN_DPI, MAX_DPI);
        self
    }

    pub fn pad_px(mut self, px: u32) -> Self {
        self.config.pad_px = px;
        self
    }

    pub fn white_threshold(mut self, t: u8) -> Self {
        self.config.white_threshold = t;
        self
    }

    pub fn detect_orientation(mut self, v: bool) -> Self {
        self.config.detect_orientation = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn tex_stem(mut self, stem: impl Into<String>) -> Self {
        self.config.tex_stem = stem.into();
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn layout(mut self, layout: LayoutServiceConfig) -> Self {
        self.config.layout = Some(layout);
        self
    }

    pub fn azure_openai(mut self, azure: AzureOpenAiConfig) -> Self {
        self.config.azure_openai = Some(azure);
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2LatexError> {
        let c = &self.config;
        if c.dpi < MIN_DPI || c.dpi > MAX_DPI {
            return Err(Pdf2LatexError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2LatexError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.white_threshold == 0 {
            return Err(Pdf2LatexError::InvalidConfig(
                "White threshold must be 1–255; 0 would treat every row as blank".into(),
            ));
        }
        if c.tex_stem.is_empty()
            || c.tex_stem.contains(['/', '\\'])
            || c.tex_stem.starts_with('.')
        {
            return Err(Pdf2LatexError::InvalidConfig(format!(
                "Output stem must be a plain file name, got '{}'",
                c.tex_stem
            )));
        }
        Ok(self.config)
    }
}

// ── Layout service ───────────────────────────────────────────────────────

/// Default REST API version of the layout-analysis service.
pub const DEFAULT_LAYOUT_API_VERSION: &str = "2024-11-30";

/// Connection settings for the cloud layout-analysis service.
#[derive(Clone)]
pub struct LayoutServiceConfig {
    /// Resource endpoint, e.g. `https://my-resource.cognitiveservices.azure.com`.
    pub endpoint: String,
    /// Subscription key sent as `Ocp-Apim-Subscription-Key`.
    pub key: String,
    /// REST API version query parameter.
    pub api_version: String,
    /// Analysis model. Default: `prebuilt-layout`.
    pub model_id: String,
    /// Delay between polls of the operation status. Default: 1000 ms.
    pub poll_interval_ms: u64,
    /// Polls before giving up. Default: 300.
    pub max_polls: u32,
    /// Timeout of each individual HTTP request. Default: 120 s.
    pub request_timeout_secs: u64,
}

impl fmt::Debug for LayoutServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("model_id", &self.model_id)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

impl LayoutServiceConfig {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            api_version: DEFAULT_LAYOUT_API_VERSION.to_string(),
            model_id: "prebuilt-layout".to_string(),
            poll_interval_ms: 1000,
            max_polls: 300,
            request_timeout_secs: 120,
        }
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_max_polls(mut self, n: u32) -> Self {
        self.max_polls = n.max(1);
        self
    }

    /// Load from `DOC_INTELLIGENCE_ENDPOINT`, `DOC_INTELLIGENCE_KEY` and the
    /// optional `DOC_INTELLIGENCE_API_VERSION`.
    pub fn from_env() -> Result<Self, Pdf2LatexError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup. Every missing required
    /// variable is reported at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Pdf2LatexError> {
        let [endpoint, key] =
            require_env(&lookup, LAYOUT_ENV_VARS).map_err(Pdf2LatexError::MissingEnv)?;
        let mut cfg = Self::new(endpoint, key);
        if let Some(v) = non_blank(&lookup, "DOC_INTELLIGENCE_API_VERSION") {
            cfg.api_version = v;
        }
        Ok(cfg)
    }
}

/// Required variables of the layout service, in report order.
pub const LAYOUT_ENV_VARS: [&str; 2] = ["DOC_INTELLIGENCE_ENDPOINT", "DOC_INTELLIGENCE_KEY"];

/// Required variables of the Azure OpenAI chat deployment, in report order.
/// The deployment itself is the model name (`AZURE_MODEL_NAME`).
pub const AZURE_OPENAI_ENV_VARS: [&str; 3] = ["AZURE_ENDPOINT", "OPENAI_API_KEY", "OPENAI_API_VERSION"];

/// Credentials of the Azure OpenAI resource that hosts the chat deployment.
#[derive(Clone)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    /// REST API version, e.g. `2024-10-21`.
    pub api_version: String,
}

impl fmt::Debug for AzureOpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureOpenAiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureOpenAiConfig {
    /// Load from `AZURE_ENDPOINT`, `OPENAI_API_KEY` and `OPENAI_API_VERSION`.
    pub fn from_env() -> Result<Self, Pdf2LatexError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Pdf2LatexError> {
        let [endpoint, api_key, api_version] =
            require_env(&lookup, AZURE_OPENAI_ENV_VARS).map_err(Pdf2LatexError::MissingEnv)?;
        Ok(Self {
            endpoint,
            api_key,
            api_version,
        })
    }

    /// Chat provider for `deployment` on this resource.
    pub fn provider(&self, deployment: &str) -> AzureOpenAIProvider {
        AzureOpenAIProvider::new(&self.endpoint, &self.api_key, deployment)
            .with_api_version(&self.api_version)
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

/// Look up every name; blank values count as missing. On failure the
/// missing names come back in the order given.
fn require_env<const N: usize>(
    lookup: &impl Fn(&str) -> Option<String>,
    names: [&str; N],
) -> Result<[String; N], Vec<String>> {
    let values = names.map(|name| non_blank(lookup, name));
    let missing: Vec<String> = names
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }
    Ok(values.map(Option::unwrap_or_default))
}

// ── External tools ───────────────────────────────────────────────────────

/// Program names (or absolute paths) of the external tools the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPaths {
    pub tesseract: String,
    pub pdflatex: String,
    pub pandoc: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            tesseract: "tesseract".to_string(),
            pdflatex: "pdflatex".to_string(),
            pandoc: "pandoc".to_string(),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which compiled documents to build from the generated LaTeX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Compile with `pdflatex`. (default)
    #[default]
    Pdf,
    /// Convert with `pandoc` to Word.
    Docx,
    /// Both of the above.
    Both,
}

impl OutputFormat {
    pub fn wants_pdf(self) -> bool {
        matches!(self, OutputFormat::Pdf | OutputFormat::Both)
    }

    pub fn wants_docx(self) -> bool {
        matches!(self, OutputFormat::Docx | OutputFormat::Both)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = Pdf2LatexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" | "word" | "word (.docx)" => Ok(OutputFormat::Docx),
            "both" => Ok(OutputFormat::Both),
            other => Err(Pdf2LatexError::InvalidConfig(format!(
                "Unknown output format '{other}' (expected pdf, docx or both)"
            ))),
        }
    }
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// First requested page number that the document does not have.
    pub fn first_missing_page(&self, total_pages: usize) -> Option<usize> {
        let missing = |p: usize| p == 0 || p > total_pages;
        match self {
            PageSelection::All => None,
            PageSelection::Single(p) => Some(*p).filter(|&p| missing(p)),
            PageSelection::Range(start, _) => Some((*start).max(1)).filter(|&s| s > total_pages),
            PageSelection::Set(pages) => {
                let mut sorted = pages.clone();
                sorted.sort_unstable();
                sorted.into_iter().find(|&p| missing(p))
            }
        }
    }
}
