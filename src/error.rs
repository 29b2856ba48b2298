//! Error types for the pdf2latex library.
//!
//! Three error types reflect three failure modes:
//!
//! * [`Pdf2LatexError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad input file, layout service unreachable, LLM not configured).
//!   Returned as `Err(Pdf2LatexError)` from the top-level `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: one page or figure could not be fully
//!   processed (orientation detection failed, figure box degenerate) but the
//!   document as a whole is fine. Stored inside
//!   [`crate::output::PageResult`] and [`crate::output::ConversionOutput`].
//!
//! * [`CompileError`] — **Non-fatal**: the LaTeX source was produced but
//!   `pdflatex` or `pandoc` could not turn it into the requested format. The
//!   `.tex` file is still a valid deliverable, so these are reported rather
//!   than propagated.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2latex library.
#[derive(Debug, Error)]
pub enum Pdf2LatexError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Rendering produced no pages, so there is nothing to analyse.
    #[error("No pages could be processed from '{path}'")]
    NoPages { path: PathBuf },

    /// Writing the corrected image-only PDF failed.
    #[error("Failed to write corrected PDF '{path}': {detail}")]
    CorrectedPdfFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory), or install\n\
libpdfium into a directory on the system library search path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Layout analysis errors ────────────────────────────────────────────
    /// Required environment variables are not set.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    /// The layout service answered with a non-success HTTP status.
    #[error("Layout analysis request failed with HTTP {status}: {body}")]
    LayoutApiError { status: u16, body: String },

    /// The layout service accepted the job but reported it as failed.
    #[error("Layout analysis failed: {detail}")]
    LayoutFailed { detail: String },

    /// Polling gave up before the analysis finished.
    #[error("Layout analysis did not finish after {polls} polls")]
    LayoutTimeout { polls: u32 },

    /// Network-level failure talking to the layout service.
    #[error("Layout service request error: {0}")]
    LayoutTransport(#[from] reqwest::Error),

    /// The service returned 401/403 — retrying will not help.
    #[error("Authentication error from '{service}': {detail}")]
    AuthError { service: String, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM call failed after every retry.
    #[error("LLM call failed after {retries} retries: {message}")]
    LlmFailed { retries: u32, message: String },

    /// The reading-order text handed to the LLM does not exist.
    #[error("Text file not found at {path}")]
    TextFileNotFound { path: PathBuf },

    /// The reading-order text is empty, so there is nothing to convert.
    #[error("Text file {path} is empty")]
    EmptyText { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode or save an image.
    #[error("Image error for '{path}': {source}")]
    ImageWriteFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page or figure.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Orientation detection could not run; the page was kept unrotated.
    #[error("Page {page}: orientation detection skipped: {detail}")]
    OrientationSkipped { page: usize, detail: String },

    /// A figure could not be cropped out of its page.
    #[error("Figure {index} on page {page}: {detail}")]
    FigureSkipped {
        index: usize,
        page: usize,
        detail: String,
    },
}

/// A failure turning the `.tex` source into a PDF or DOCX.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum CompileError {
    /// The tool ran and exited unsuccessfully.
    #[error("{tool} failed (exit code {code:?}):\n{stderr}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool is not installed.
    #[error("`{tool}` not found. Install it and add it to your PATH.")]
    NotFound { tool: String },

    /// The tool claimed success but the expected file is absent.
    #[error("{tool} finished but produced no output at '{}'", path.display())]
    MissingOutput { tool: String, path: PathBuf },

    /// Spawning the tool failed for another reason.
    #[error("Could not run {tool}: {detail}")]
    Spawn { tool: String, detail: String },
}
