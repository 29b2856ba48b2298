//! Image encoding: `DynamicImage` → PNG bytes or PNG file.
//!
//! PNG is lossless; JPEG artefacts around glyph edges hurt both Tesseract's
//! orientation detection and the layout model's text recognition.

use crate::error::Pdf2LatexError;
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Encode an image as PNG in memory (used to feed `tesseract` via stdin).
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} image → {} PNG bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Save an image as PNG on a blocking thread.
pub async fn save_png(img: DynamicImage, path: &Path) -> Result<(), Pdf2LatexError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        img.save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| Pdf2LatexError::ImageWriteFailed { path, source })
    })
    .await
    .map_err(|e| Pdf2LatexError::Internal(format!("PNG writer task panicked: {e}")))?
}
