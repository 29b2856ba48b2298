//! Orientation correction using Tesseract's orientation-and-script detection.
//!
//! Scanned exam papers regularly contain pages fed upside down or sideways.
//! `tesseract --psm 0` reports how far the page must be turned clockwise to
//! be upright (`Rotate: N`); we apply exactly that rotation. The page PNG
//! goes through stdin so no temp files are needed.
//!
//! Detection failure is never fatal. Blank pages, pages with too little text
//! and hosts without Tesseract all fall back to the unrotated image.

use crate::pipeline::encode::encode_png;
use image::DynamicImage;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

const OSD_TIMEOUT: Duration = Duration::from_secs(60);

/// Parsed OSD report.
#[derive(Debug, Clone, PartialEq)]
pub struct OsdInfo {
    /// Clockwise correction in degrees: 0, 90, 180 or 270.
    pub rotate: u16,
    pub orientation_confidence: Option<f32>,
    pub script: Option<String>,
}

/// Parse the text Tesseract prints for `--psm 0`.
///
/// Returns `None` when no valid `Rotate:` line is present.
pub fn parse_osd(text: &str) -> Option<OsdInfo> {
    let mut rotate = None;
    let mut confidence = None;
    let mut script = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Rotate" => {
                rotate = value
                    .parse::<u16>()
                    .ok()
                    .filter(|r| matches!(r, 0 | 90 | 180 | 270));
            }
            "Orientation confidence" => confidence = value.parse::<f32>().ok(),
            "Script" => script = Some(value.to_string()),
            _ => {}
        }
    }

    rotate.map(|rotate| OsdInfo {
        rotate,
        orientation_confidence: confidence,
        script,
    })
}

/// Rotate `img` clockwise by `degrees`; unknown angles leave it unchanged.
pub fn apply_rotation(img: DynamicImage, degrees: u16) -> DynamicImage {
    match degrees {
        90 => img.rotate90(),
        180 => img.rotate180(),
        270 => img.rotate270(),
        _ => img,
    }
}

/// Run OSD on one page.
///
/// `Err` carries a human-readable reason suitable for a
/// [`crate::error::PageError::OrientationSkipped`].
pub async fn detect_orientation(tesseract: &str, img: &DynamicImage) -> Result<OsdInfo, String> {
    let png = encode_png(img).map_err(|e| format!("PNG encoding failed: {e}"))?;

    let mut child = Command::new(tesseract)
        .args(["stdin", "stdout", "--psm", "0"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("`{tesseract}` not found")
            } else {
                format!("could not start {tesseract}: {e}")
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(&png)
            .await
            .map_err(|e| format!("writing page to {tesseract}: {e}"))?;
        // Dropping stdin closes the pipe so tesseract sees EOF.
    }

    let output = timeout(OSD_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| format!("{tesseract} timed out after {}s", OSD_TIMEOUT.as_secs()))?
        .map_err(|e| format!("{tesseract} failed: {e}"))?;

    // Depending on the build, the OSD report lands on stdout or stderr.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(format!(
            "{tesseract} exited with {}: {}",
            output.status,
            last_line(&stderr)
        ));
    }

    let info = parse_osd(&stdout)
        .or_else(|| parse_osd(&stderr))
        .ok_or_else(|| format!("no orientation in OSD output: {}", last_line(&stderr)))?;

    debug!(
        rotate = info.rotate,
        confidence = ?info.orientation_confidence,
        "OSD result"
    );
    Ok(info)
}

fn last_line(s: &str) -> &str {
    s.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}
