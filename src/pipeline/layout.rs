//! Cloud layout analysis (`prebuilt-layout`) over the corrected PDF.
//!
//! The service is asynchronous: the initial `POST …:analyze` answers `202
//! Accepted` with an `Operation-Location` header, and the result is fetched by
//! polling that URL until `status` becomes `succeeded` or `failed`.
//!
//! Only the fields the pipeline reads are typed. Everything else in the
//! response is kept in `extra` maps so `analysis.json` stays a faithful copy
//! of what the service returned.

use crate::config::LayoutServiceConfig;
use crate::error::Pdf2LatexError;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION: &str = "Operation-Location";

// ── Response model ──────────────────────────────────────────────────────────

/// The `analyzeResult` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub pages: Vec<LayoutPage>,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub figures: Vec<Figure>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPage {
    pub page_number: usize,
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub words: Vec<Value>,
    #[serde(default)]
    pub lines: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub bounding_regions: Vec<BoundingRegion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Figure {
    #[serde(default)]
    pub bounding_regions: Vec<BoundingRegion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A region on one page. Coordinates are in the page's unit (inches for PDFs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRegion {
    pub page_number: usize,
    #[serde(default)]
    pub polygon: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<Vec<f64>>,
}

impl BoundingRegion {
    /// Flat `[x0, y0, x1, y1, …]` coordinates, preferring `boundingBox`.
    pub fn coords(&self) -> &[f64] {
        match &self.bounding_box {
            Some(b) if !b.is_empty() => b,
            _ => &self.polygon,
        }
    }

    /// Mean of the polygon's x and y values, or `None` for an empty polygon.
    pub fn center(&self) -> Option<(f64, f64)> {
        let xs: Vec<f64> = self.polygon.iter().step_by(2).copied().collect();
        let ys: Vec<f64> = self.polygon.iter().skip(1).step_by(2).copied().collect();
        if xs.is_empty() || ys.is_empty() {
            return None;
        }
        let cx = xs.iter().sum::<f64>() / xs.len() as f64;
        let cy = ys.iter().sum::<f64>() / ys.len() as f64;
        Some((cx, cy))
    }
}

/// Polling envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationStatus {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<Value>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// HTTP client for the layout-analysis service.
pub struct LayoutClient {
    http: reqwest::Client,
    config: LayoutServiceConfig,
}

impl LayoutClient {
    pub fn new(config: LayoutServiceConfig) -> Result<Self, Pdf2LatexError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// URL of the `analyze` call.
    pub fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model_id,
            self.config.api_version
        )
    }

    /// Submit a PDF and wait for the layout result.
    pub async fn analyze(&self, pdf_bytes: Vec<u8>) -> Result<AnalyzeResult, Pdf2LatexError> {
        let url = self.analyze_url();
        info!("Submitting {} bytes for layout analysis", pdf_bytes.len());

        let response = self
            .http
            .post(&url)
            .header(KEY_HEADER, &self.config.key)
            .header(CONTENT_TYPE, "application/pdf")
            .body(pdf_bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(status, response.text().await.unwrap_or_default()));
        }

        let operation = response
            .headers()
            .get(OPERATION_LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| Pdf2LatexError::LayoutFailed {
                detail: format!("HTTP {status} without an {OPERATION_LOCATION} header"),
            })?;

        debug!("Layout operation: {}", operation);
        self.poll(&operation).await
    }

    async fn poll(&self, operation: &str) -> Result<AnalyzeResult, Pdf2LatexError> {
        for attempt in 1..=self.config.max_polls {
            let response = self
                .http
                .get(operation)
                .header(KEY_HEADER, &self.config.key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(http_error(status, response.text().await.unwrap_or_default()));
            }

            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let body: OperationStatus = response.json().await?;
            match body.status.as_str() {
                "succeeded" => {
                    info!("Layout analysis succeeded after {} polls", attempt);
                    return Ok(body.analyze_result.unwrap_or_default());
                }
                "failed" | "canceled" => {
                    let detail = body
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| format!("operation {}", body.status));
                    return Err(Pdf2LatexError::LayoutFailed { detail });
                }
                other => {
                    debug!("Layout poll {}: status {}", attempt, other);
                }
            }

            let wait_ms = poll_wait_ms(retry_after, self.config.poll_interval_ms);
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }

        warn!("Layout analysis still running after {} polls", self.config.max_polls);
        Err(Pdf2LatexError::LayoutTimeout {
            polls: self.config.max_polls,
        })
    }
}

/// Longest wait between two polls, whatever `Retry-After` asks for.
pub const MAX_POLL_WAIT_MS: u64 = 60_000;

/// Honour `Retry-After` (seconds), but never poll faster than configured
/// nor wait longer than [`MAX_POLL_WAIT_MS`].
fn poll_wait_ms(retry_after_secs: Option<u64>, poll_interval_ms: u64) -> u64 {
    retry_after_secs
        .map(|s| s.saturating_mul(1000).max(poll_interval_ms))
        .unwrap_or(poll_interval_ms)
        .min(MAX_POLL_WAIT_MS.max(poll_interval_ms))
}

fn http_error(status: StatusCode, body: String) -> Pdf2LatexError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Pdf2LatexError::AuthError {
            service: "layout analysis".to_string(),
            detail: body,
        }
    } else {
        Pdf2LatexError::LayoutApiError {
            status: status.as_u16(),
            body,
        }
    }
}

// ── Post-processing ──────────────────────────────────────────────────────────

/// Ensure every page `1..=sizes.len()` has an entry, ordered by page number.
///
/// `sizes[i]` is the pixel size of fixed page `i + 1`. Pages the service
/// dropped (typically blank ones) are synthesised with inch dimensions
/// derived from the pixel size and the render DPI.
pub fn pad_missing_pages(result: &mut AnalyzeResult, sizes: &[(u32, u32)], dpi: u32) {
    let dpi = f64::from(dpi.max(1));
    let mut existing: Vec<LayoutPage> = std::mem::take(&mut result.pages);

    let mut pages = Vec::with_capacity(sizes.len());
    for (i, &(w, h)) in sizes.iter().enumerate() {
        let page_number = i + 1;
        match existing.iter().position(|p| p.page_number == page_number) {
            Some(pos) => pages.push(existing.swap_remove(pos)),
            None => {
                debug!("Layout result has no page {}; synthesising it", page_number);
                pages.push(LayoutPage {
                    page_number,
                    angle: 0.0,
                    width: f64::from(w) / dpi,
                    height: f64::from(h) / dpi,
                    unit: "inch".to_string(),
                    words: Vec::new(),
                    lines: Vec::new(),
                    extra: Map::new(),
                });
            }
        }
    }

    result.pages = pages;
}

/// Persist the (padded) layout result as pretty JSON.
pub async fn write_analysis_json(result: &AnalyzeResult, path: &Path) -> Result<(), Pdf2LatexError> {
    let json = serde_json::to_vec_pretty(result)
        .map_err(|e| Pdf2LatexError::Internal(format!("serialising layout result: {e}")))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| Pdf2LatexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    info!("Analysis JSON saved to {}", path.display());
    Ok(())
}
