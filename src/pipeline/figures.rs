//! Crop figures out of the fixed page images.
//!
//! The layout service reports figure polygons in page units (inches). They
//! are scaled by the page's reported size to fractions, then by the pixel
//! size of the fixed image, truncated and clamped. Figures whose box comes
//! out empty are reported and skipped.

use crate::error::PageError;
use crate::output::{CropBox, FigureCrop};
use crate::pipeline::encode::save_png;
use crate::pipeline::layout::{AnalyzeResult, BoundingRegion};
use image::DynamicImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory, relative to the work dir, holding the figure PNGs.
pub const FIGURES_DIR: &str = "figures";

/// Map a figure region to a pixel box in an image of `img_w` x `img_h`.
///
/// `page_w` / `page_h` are the page dimensions in the region's unit.
pub fn pixel_box(
    region: &BoundingRegion,
    page_w: f64,
    page_h: f64,
    img_w: u32,
    img_h: u32,
) -> Option<CropBox> {
    let coords = region.coords();
    let xs: Vec<f64> = coords.iter().step_by(2).copied().collect();
    let ys: Vec<f64> = coords.iter().skip(1).step_by(2).copied().collect();
    if xs.is_empty() || ys.is_empty() || page_w <= 0.0 || page_h <= 0.0 {
        return None;
    }

    let min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
    let max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let to_px = |frac: f64, size: u32| -> i64 { (frac * f64::from(size)) as i64 };

    let x0 = to_px(min(&xs) / page_w, img_w).max(0);
    let x1 = to_px(max(&xs) / page_w, img_w).min(i64::from(img_w));
    let y0 = to_px(min(&ys) / page_h, img_h).max(0);
    let y1 = to_px(max(&ys) / page_h, img_h).min(i64::from(img_h));

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(CropBox {
        x1: x0 as u32,
        y1: y0 as u32,
        x2: x1 as u32,
        y2: y1 as u32,
    })
}

/// Relative path of figure `index` on `page`.
pub fn figure_rel_path(page: usize, index: usize) -> PathBuf {
    Path::new(FIGURES_DIR).join(format!("figure_{page}_{index}.png"))
}

/// Crop and save every figure of `layout`.
///
/// `images[i]` is fixed page `i + 1`. PNGs land in `work_dir/figures/`.
/// Returns the saved figures plus one [`PageError::FigureSkipped`] per figure
/// that could not be extracted.
pub async fn extract_figures(
    layout: &AnalyzeResult,
    images: &[DynamicImage],
    work_dir: &Path,
) -> Result<(Vec<FigureCrop>, Vec<PageError>), crate::error::Pdf2LatexError> {
    let page_sizes: HashMap<usize, (f64, f64)> = layout
        .pages
        .iter()
        .map(|p| (p.page_number, (p.width, p.height)))
        .collect();

    let mut saved = Vec::new();
    let mut skipped = Vec::new();

    for (index, figure) in layout.figures.iter().enumerate() {
        let Some(region) = figure.bounding_regions.first() else {
            skipped.push(PageError::FigureSkipped {
                index,
                page: 0,
                detail: "no bounding region".to_string(),
            });
            continue;
        };
        let page = region.page_number;

        let Some(img) = page.checked_sub(1).and_then(|i| images.get(i)) else {
            warn!("Figure {} refers to page {} which was not rendered", index, page);
            skipped.push(PageError::FigureSkipped {
                index,
                page,
                detail: format!("page {page} not rendered"),
            });
            continue;
        };

        // Unpadded results may lack the page entry.
        let (page_w, page_h) = page_sizes.get(&page).copied().unwrap_or((1.0, 1.0));

        let Some(bbox) = pixel_box(region, page_w, page_h, img.width(), img.height()) else {
            debug!("Figure {} on page {} has an empty pixel box", index, page);
            skipped.push(PageError::FigureSkipped {
                index,
                page,
                detail: "empty crop box".to_string(),
            });
            continue;
        };

        let rel = figure_rel_path(page, index);
        let crop = img.crop_imm(bbox.x1, bbox.y1, bbox.width(), bbox.height());
        save_png(crop, &work_dir.join(&rel)).await?;
        debug!("Saved figure {} to {}", index, rel.display());

        saved.push(FigureCrop {
            index,
            page,
            bbox,
            path: rel,
        });
    }

    info!("Extracted {} figures ({} skipped)", saved.len(), skipped.len());
    Ok((saved, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::{Figure, LayoutPage};
    use image::{GenericImageView, Rgba, RgbaImage};
    use serde_json::Map;

    fn region(page: usize, poly: &[f64]) -> BoundingRegion {
        BoundingRegion {
            page_number: page,
            polygon: poly.to_vec(),
            bounding_box: None,
        }
    }

    #[test]
    fn inch_polygon_maps_to_pixels() {
        // 8 x 16 in page rendered to 800 x 1600 px.
        let r = region(1, &[1.0, 2.0, 4.0, 2.0, 4.0, 5.0, 1.0, 5.0]);
        let b = pixel_box(&r, 8.0, 16.0, 800, 1600).unwrap();
        assert_eq!(b, CropBox { x1: 100, y1: 200, x2: 400, y2: 500 });
    }

    #[test]
    fn box_is_clamped_to_image() {
        let r = region(1, &[-1.0, -1.0, 20.0, -1.0, 20.0, 20.0, -1.0, 20.0]);
        let b = pixel_box(&r, 10.0, 10.0, 300, 200).unwrap();
        assert_eq!(b, CropBox { x1: 0, y1: 0, x2: 300, y2: 200 });
    }

    #[test]
    fn degenerate_box_is_rejected() {
        let r = region(1, &[2.0, 2.0, 2.0, 2.0]);
        assert!(pixel_box(&r, 10.0, 10.0, 100, 100).is_none());
        assert!(pixel_box(&region(1, &[]), 10.0, 10.0, 100, 100).is_none());
        let r = region(1, &[1.0, 1.0, 2.0, 2.0]);
        assert!(pixel_box(&r, 0.0, 10.0, 100, 100).is_none());
    }

    #[test]
    fn rel_path_format() {
        assert_eq!(
            figure_rel_path(2, 5),
            Path::new("figures").join("figure_2_5.png")
        );
    }

    fn page(n: usize, w: f64, h: f64) -> LayoutPage {
        LayoutPage {
            page_number: n,
            angle: 0.0,
            width: w,
            height: h,
            unit: "inch".into(),
            words: vec![],
            lines: vec![],
            extra: Map::new(),
        }
    }

    fn figure(r: BoundingRegion) -> Figure {
        Figure {
            bounding_regions: vec![r],
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn extracts_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(FIGURES_DIR)).unwrap();

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([9, 9, 9, 255])));
        let layout = AnalyzeResult {
            pages: vec![page(1, 1.0, 1.0)],
            figures: vec![
                figure(region(1, &[0.25, 0.25, 0.75, 0.25, 0.75, 0.75, 0.25, 0.75])),
                figure(region(3, &[0.1, 0.1, 0.2, 0.2])),
                Figure::default(),
            ],
            ..Default::default()
        };

        let (saved, skipped) = extract_figures(&layout, &[img], dir.path()).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].index, 0);
        assert_eq!(saved[0].path, figure_rel_path(1, 0));

        let crop = image::open(dir.path().join(&saved[0].path)).unwrap();
        assert_eq!(crop.dimensions(), (50, 50));

        assert_eq!(skipped.len(), 2);
        assert!(matches!(skipped[0], PageError::FigureSkipped { index: 1, page: 3, .. }));
        assert!(matches!(skipped[1], PageError::FigureSkipped { index: 2, .. }));
    }
}
