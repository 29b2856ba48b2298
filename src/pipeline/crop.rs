//! Whitespace trimming around the printed content of a page.
//!
//! A row or column is "content" when its mean grayscale value is below the
//! white threshold. The box spanning the first and last content row and
//! column is grown by the padding, clamped to the image, and cropped with an
//! exclusive right/bottom edge.

use crate::output::CropBox;
use image::DynamicImage;

/// Find the padded content box, or `None` for a blank page.
pub fn content_box(img: &DynamicImage, white_threshold: u8, pad_px: u32) -> Option<CropBox> {
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return None;
    }

    let mut row_sums = vec![0u64; h as usize];
    let mut col_sums = vec![0u64; w as usize];
    for (x, y, p) in gray.enumerate_pixels() {
        let v = u64::from(p.0[0]);
        row_sums[y as usize] += v;
        col_sums[x as usize] += v;
    }

    let threshold = f64::from(white_threshold);
    let is_content = |sum: u64, n: u32| (sum as f64 / f64::from(n)) < threshold;

    let first_row = row_sums.iter().position(|&s| is_content(s, w))?;
    let last_row = row_sums.iter().rposition(|&s| is_content(s, w))?;
    let first_col = col_sums.iter().position(|&s| is_content(s, h))?;
    let last_col = col_sums.iter().rposition(|&s| is_content(s, h))?;

    Some(CropBox {
        x1: (first_col as u32).saturating_sub(pad_px),
        y1: (first_row as u32).saturating_sub(pad_px),
        x2: (last_col as u32).saturating_add(pad_px).min(w - 1),
        y2: (last_row as u32).saturating_add(pad_px).min(h - 1),
    })
}

/// Crop `img` to its content box. Blank pages are returned untouched.
pub fn crop_to_content(
    img: DynamicImage,
    white_threshold: u8,
    pad_px: u32,
) -> (DynamicImage, Option<CropBox>) {
    match content_box(&img, white_threshold, pad_px) {
        Some(b) if b.width() > 0 && b.height() > 0 => {
            let cropped = img.crop_imm(b.x1, b.y1, b.width(), b.height());
            (cropped, Some(b))
        }
        _ => (img, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, GrayImage};

    fn page_with_block(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> DynamicImage {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn finds_padded_box() {
        let img = page_with_block(200, 100, 50, 30, 59, 39);
        let b = content_box(&img, 245, 5).expect("content present");
        assert_eq!(b, CropBox { x1: 45, y1: 25, x2: 64, y2: 44 });
    }

    #[test]
    fn padding_is_clamped_to_image() {
        let img = page_with_block(100, 80, 2, 3, 97, 78);
        let b = content_box(&img, 245, 20).unwrap();
        assert_eq!(b, CropBox { x1: 0, y1: 0, x2: 99, y2: 79 });
    }

    #[test]
    fn blank_page_has_no_box() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 50, Luma([255])));
        assert!(content_box(&img, 245, 20).is_none());
        let (out, b) = crop_to_content(img, 245, 20);
        assert!(b.is_none());
        assert_eq!(out.dimensions(), (50, 50));
    }

    #[test]
    fn faint_noise_below_threshold_mean_is_ignored() {
        // A single grey pixel in a 100-wide row barely moves the row mean.
        let mut img = GrayImage::from_pixel(100, 100, Luma([255]));
        img.put_pixel(10, 10, Luma([200]));
        let img = DynamicImage::ImageLuma8(img);
        assert!(content_box(&img, 245, 0).is_none());
    }

    #[test]
    fn crop_uses_exclusive_right_edge() {
        let img = page_with_block(200, 100, 50, 30, 59, 39);
        let (out, b) = crop_to_content(img, 245, 5);
        let b = b.unwrap();
        assert_eq!(out.dimensions(), (b.x2 - b.x1, b.y2 - b.y1));
        assert_eq!(out.dimensions(), (19, 19));
        // Top-left of the black block sits at the padding offset.
        assert_eq!(out.get_pixel(5, 5).0[0], 0);
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
    }
}
