//! pdfium access: rasterise pages, read metadata, write the corrected PDF.
//!
//! pdfium keeps thread-local state and blocks on CPU, so every entry point
//! here hops onto `spawn_blocking` and binds its own `Pdfium` instance.

use crate::config::ConversionConfig;
use crate::error::Pdf2LatexError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Bind to a pdfium library.
///
/// `PDFIUM_LIB_PATH` may name the library file itself or the directory that
/// contains it; otherwise the system library search path is used.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2LatexError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            let lib = if path.is_dir() {
                PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(p.as_str()))
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2LatexError::PdfiumBindingFailed(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Rasterise selected pages of a PDF at `config.dpi`.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ConversionConfig,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, Pdf2LatexError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| Pdf2LatexError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, Pdf2LatexError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages, rendering at {} DPI", total_pages, dpi);

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = pages
            .get(page_index(idx, total_pages)?)
            .map_err(|e| Pdf2LatexError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2LatexError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(results)
}

/// pdfium addresses pages with a `u16`; larger indices cannot be rendered.
fn page_index(idx: usize, total_pages: usize) -> Result<u16, Pdf2LatexError> {
    u16::try_from(idx).map_err(|_| Pdf2LatexError::PageOutOfRange {
        page: idx + 1,
        total: total_pages,
    })
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2LatexError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2LatexError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2LatexError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2LatexError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2LatexError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2LatexError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2LatexError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Page size in PDF points for an image rendered at `dpi`.
pub fn page_size_points(width_px: u32, height_px: u32, dpi: u32) -> (f32, f32) {
    let scale = POINTS_PER_INCH / dpi.max(1) as f32;
    (width_px as f32 * scale, height_px as f32 * scale)
}

/// Write an image-only PDF with one full-bleed page per image.
///
/// Each page is sized so the image sits at `dpi`, which keeps the layout
/// service's inch coordinates consistent with the pixel grid of the images.
pub async fn write_image_pdf(
    images: Vec<DynamicImage>,
    dpi: u32,
    out_path: &Path,
) -> Result<(), Pdf2LatexError> {
    let path = out_path.to_path_buf();
    tokio::task::spawn_blocking(move || write_image_pdf_blocking(&images, dpi, &path))
        .await
        .map_err(|e| Pdf2LatexError::Internal(format!("PDF writer task panicked: {}", e)))?
}

fn write_image_pdf_blocking(
    images: &[DynamicImage],
    dpi: u32,
    out_path: &Path,
) -> Result<(), Pdf2LatexError> {
    let fail = |detail: String| Pdf2LatexError::CorrectedPdfFailed {
        path: out_path.to_path_buf(),
        detail,
    };

    let pdfium = bind_pdfium()?;
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| fail(format!("{e:?}")))?;

    for (i, image) in images.iter().enumerate() {
        let (w, h) = page_size_points(image.width(), image.height(), dpi);
        let size = PdfPagePaperSize::Custom(PdfPoints::new(w), PdfPoints::new(h));

        let mut page = document
            .pages_mut()
            .create_page_at_end(size)
            .map_err(|e| fail(format!("page {}: {e:?}", i + 1)))?;

        page.objects_mut()
            .create_image_object(
                PdfPoints::ZERO,
                PdfPoints::ZERO,
                image,
                Some(PdfPoints::new(w)),
                Some(PdfPoints::new(h)),
            )
            .map_err(|e| fail(format!("page {} image: {e:?}", i + 1)))?;
    }

    document
        .save_to_file(out_path)
        .map_err(|e| fail(format!("{e:?}")))?;

    info!(
        "Corrected PDF saved to {} ({} pages)",
        out_path.display(),
        images.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_matches_dpi() {
        // A4 at 300 DPI is 2480 x 3508 px → 595.2 x 841.9 pt.
        let (w, h) = page_size_points(2480, 3508, 300);
        assert!((w - 595.2).abs() < 0.01, "w = {w}");
        assert!((h - 841.92).abs() < 0.01, "h = {h}");
    }

    #[test]
    fn page_index_rejects_what_pdfium_cannot_address() {
        assert_eq!(page_index(0, 1).unwrap(), 0);
        assert_eq!(page_index(65_535, 70_000).unwrap(), u16::MAX);
        match page_index(65_536, 70_000) {
            Err(Pdf2LatexError::PageOutOfRange { page, total }) => {
                assert_eq!((page, total), (65_537, 70_000));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn page_size_guards_zero_dpi() {
        let (w, _) = page_size_points(72, 72, 0);
        assert!(w.is_finite());
    }
}
