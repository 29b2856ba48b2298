//! Progress-callback trait for per-stage and per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages.
//!
//! # Example
//!
//! ```rust
//! use pdf2latex::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl ConversionProgressCallback for StageLogger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {}", stage.label());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(StageLogger))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The coarse stages of a conversion, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Render,
    FixPages,
    Layout,
    Figures,
    ReadingOrder,
    Latex,
    CompilePdf,
    ConvertDocx,
}

impl Stage {
    /// Short human label used by the CLI and the web UI.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Render => "Rendering pages",
            Stage::FixPages => "Fixing orientation and margins",
            Stage::Layout => "Analysing layout",
            Stage::Figures => "Extracting figures",
            Stage::ReadingOrder => "Ordering text",
            Stage::Latex => "Generating LaTeX",
            Stage::CompilePdf => "Compiling to PDF",
            Stage::ConvertDocx => "Converting to Word",
        }
    }
}

/// Called by the conversion pipeline as it runs.
///
/// Implementations must be `Send + Sync`: page fixing runs concurrently, so
/// `on_page_fixed` and `on_page_warning` may be called from several tasks at
/// once. All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the number of selected pages is known.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a page has been oriented, cropped and saved.
    ///
    /// * `page_num`  — 1-indexed page number
    /// * `rotation`  — clockwise correction applied, in degrees
    fn on_page_fixed(&self, page_num: usize, total_pages: usize, rotation: u16) {
        let _ = (page_num, total_pages, rotation);
    }

    /// Called for non-fatal page problems (e.g. orientation skipped).
    fn on_page_warning(&self, page_num: usize, warning: &str) {
        let _ = (page_num, warning);
    }

    /// Called once after the last stage.
    ///
    /// * `outputs` — number of compiled documents produced besides the `.tex`
    fn on_conversion_complete(&self, total_pages: usize, outputs: usize) {
        let _ = (total_pages, outputs);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
