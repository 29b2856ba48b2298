//! Result types returned by a conversion.

use crate::error::{CompileError, PageError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a finished conversion produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Directory holding every artefact of the run.
    pub work_dir: PathBuf,
    /// Path of the generated LaTeX source.
    pub tex_path: PathBuf,
    /// Full LaTeX document (preamble + body).
    pub latex: String,
    /// Compiled PDF, when requested and successful.
    pub pdf_path: Option<PathBuf>,
    /// Word document, when requested and successful.
    pub docx_path: Option<PathBuf>,
    /// Per-page results of the fixing stage, ordered by page number.
    pub pages: Vec<PageResult>,
    /// Figures cropped out of the fixed pages.
    pub figures: Vec<FigureCrop>,
    /// Non-fatal figure problems.
    pub figure_errors: Vec<PageError>,
    /// Failures of `pdflatex` / `pandoc`.
    pub compile_errors: Vec<CompileError>,
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Number of compiled documents produced besides the `.tex`.
    pub fn compiled_outputs(&self) -> usize {
        usize::from(self.pdf_path.is_some()) + usize::from(self.docx_path.is_some())
    }
}

/// Result of orienting, cropping and saving one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Clockwise rotation applied, in degrees (0, 90, 180 or 270).
    pub rotation: u16,
    /// Crop box `(x1, y1, x2, y2)` in the oriented image, if any was applied.
    pub crop: Option<CropBox>,
    /// Final size in pixels.
    pub width: u32,
    pub height: u32,
    /// Saved PNG of the fixed page.
    pub image_path: PathBuf,
    /// Orientation detection problem, if any.
    pub error: Option<PageError>,
}

/// A crop rectangle with an exclusive right and bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropBox {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// A figure saved from a fixed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureCrop {
    /// Index of the figure in the layout result.
    pub index: usize,
    /// 1-indexed page the figure sits on.
    pub page: usize,
    /// Pixel box in the fixed page image.
    pub bbox: CropBox,
    /// Path relative to the work dir, e.g. `figures/figure_1_0.png`.
    pub path: PathBuf,
}

/// Timing and volume counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages rendered and fixed.
    pub processed_pages: usize,
    /// Pages whose orientation detection was skipped.
    pub orientation_skipped: usize,
    /// Paragraphs returned by the layout analysis.
    pub paragraphs: usize,
    /// Figures saved as images.
    pub figures: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub fix_duration_ms: u64,
    pub layout_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub compile_duration_ms: u64,
}

/// Document-level metadata read from the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
