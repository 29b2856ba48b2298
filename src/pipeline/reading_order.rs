//! Linearise the layout result into plain text in reading order.
//!
//! Paragraphs and figures are placed by the centre of their first bounding
//! region and sorted top-to-bottom, then left-to-right, page by page. Figures
//! become `[FIGURE: figures/figure_P_I.png]` markers that the LaTeX prompt
//! turns into figure environments.

use crate::error::Pdf2LatexError;
use crate::output::FigureCrop;
use crate::pipeline::layout::AnalyzeResult;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    Paragraph,
    Figure,
}

/// One positioned piece of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub kind: ElementKind,
    /// Index in the layout result's `paragraphs` or `figures`.
    pub index: usize,
    pub page: usize,
    pub y_center: f64,
    pub x_center: f64,
    pub content: String,
}

/// Marker text for a figure; `path` is empty when no crop was saved.
pub fn figure_marker(path: &str) -> String {
    format!("[FIGURE: {path}]")
}

/// Collect positioned elements from `layout`, sorted into reading order.
///
/// Items without a bounding region are dropped. `figures` maps layout figure
/// indices to the crops that were saved.
pub fn build_elements(layout: &AnalyzeResult, figures: &[FigureCrop]) -> Vec<Element> {
    let saved: HashMap<usize, &FigureCrop> = figures.iter().map(|f| (f.index, f)).collect();
    let mut elements = Vec::with_capacity(layout.paragraphs.len() + layout.figures.len());

    for (index, para) in layout.paragraphs.iter().enumerate() {
        let Some(region) = para.bounding_regions.first() else {
            continue;
        };
        let (x_center, y_center) = region.center().unwrap_or((0.0, 0.0));
        elements.push(Element {
            kind: ElementKind::Paragraph,
            index,
            page: region.page_number,
            y_center,
            x_center,
            content: para.content.clone(),
        });
    }

    for (index, fig) in layout.figures.iter().enumerate() {
        let Some(region) = fig.bounding_regions.first() else {
            continue;
        };
        let (x_center, y_center) = region.center().unwrap_or((0.0, 0.0));
        // Marker paths always use forward slashes so the LaTeX stays portable.
        let path = saved
            .get(&index)
            .map(|f| f.path.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        elements.push(Element {
            kind: ElementKind::Figure,
            index,
            page: region.page_number,
            y_center,
            x_center,
            content: figure_marker(&path),
        });
    }

    sort_reading_order(&mut elements);
    elements
}

/// Stable sort by `(page, y_center, x_center)`.
pub fn sort_reading_order(elements: &mut [Element]) {
    elements.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then_with(|| a.y_center.partial_cmp(&b.y_center).unwrap_or(Ordering::Equal))
            .then_with(|| a.x_center.partial_cmp(&b.x_center).unwrap_or(Ordering::Equal))
    });
}

/// Each element's content followed by a blank line.
pub fn render_text(elements: &[Element]) -> String {
    let mut out = String::new();
    for e in elements {
        out.push_str(&e.content);
        out.push_str("\n\n");
    }
    out
}

/// Write the reading-order text to `path` (`output.txt`).
pub async fn write_text(elements: &[Element], path: &Path) -> Result<String, Pdf2LatexError> {
    let text = render_text(elements);
    tokio::fs::write(path, &text)
        .await
        .map_err(|source| Pdf2LatexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Output text written to {} ({} elements)", path.display(), elements.len());
    Ok(text)
}
