//! Input resolution: normalise a user-supplied path, URL or upload to a local PDF.
//!
//! pdfium needs a file-system path, so URLs and uploaded bytes are written to
//! a `TempDir` that lives as long as the returned [`ResolvedInput`]. The
//! `%PDF` magic bytes are checked before returning so callers get a meaningful
//! error rather than a pdfium failure further down the pipeline.

use crate::error::Pdf2LatexError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved input — either a local path or a temp file we own.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was downloaded or uploaded into a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Temporary { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Temporary { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2LatexError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Write in-memory PDF bytes (e.g. an HTTP upload) to a managed temp file.
pub async fn resolve_bytes(bytes: &[u8], file_name: &str) -> Result<ResolvedInput, Pdf2LatexError> {
    let temp_dir = TempDir::with_prefix("pdf2latex_upload_")
        .map_err(|e| Pdf2LatexError::Internal(format!("tempdir: {e}")))?;
    let file_path = temp_dir.path().join(sanitize_file_name(file_name));

    check_magic(bytes, &file_path)?;

    tokio::fs::write(&file_path, bytes)
        .await
        .map_err(|e| Pdf2LatexError::Internal(format!("Failed to write temp file: {e}")))?;

    debug!("Uploaded PDF stored at {}", file_path.display());
    Ok(ResolvedInput::Temporary {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2LatexError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(Pdf2LatexError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
                return Err(Pdf2LatexError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2LatexError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2LatexError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2LatexError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2LatexError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2LatexError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2LatexError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2LatexError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);

    let temp_dir = TempDir::with_prefix("pdf2latex_download_")
        .map_err(|e| Pdf2LatexError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2LatexError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic(&bytes, &file_path)?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Pdf2LatexError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Temporary {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

fn check_magic(bytes: &[u8], path: &Path) -> Result<(), Pdf2LatexError> {
    if bytes.len() < 4 || &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Pdf2LatexError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return sanitize_file_name(last);
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Keep only the final path component and a conservative character set.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "input.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}
