use super::html::{self, Download, UI_DEFAULT_DPI};
use super::AppState;
use crate::config::{OutputFormat, MAX_DPI, MIN_DPI};
use crate::convert::convert_from_bytes;
use crate::error::Pdf2LatexError;
use crate::output::ConversionOutput;
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::path::Path as FsPath;
use uuid::Uuid;

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn index() -> Html<String> {
    Html(html::index_page())
}

/// Fields of the upload form.
struct UploadForm {
    file: Option<(String, Bytes)>,
    dpi: u32,
    format: OutputFormat,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm {
        file: None,
        dpi: UI_DEFAULT_DPI,
        format: OutputFormat::Pdf,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed upload: {e}"))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| "upload.pdf".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read upload: {e}"))?;
                if !bytes.is_empty() {
                    form.file = Some((file_name, bytes));
                }
            }
            Some("dpi") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read dpi: {e}"))?;
                let dpi: u32 = text
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid DPI '{}'", text.trim()))?;
                if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
                    return Err(format!("DPI must be {MIN_DPI}–{MAX_DPI}, got {dpi}"));
                }
                form.dpi = dpi;
            }
            Some("format") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read format: {e}"))?;
                form.format = text.parse().map_err(|e: Pdf2LatexError| e.to_string())?;
            }
            _ => {}
        }
    }
    Ok(form)
}

#[tracing::instrument(skip(state, multipart))]
pub async fn convert(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let form = match read_form(&mut multipart).await {
        Ok(form) => form,
        Err(message) => return failure(StatusCode::BAD_REQUEST, &message),
    };
    let Some((file_name, bytes)) = form.file else {
        return failure(StatusCode::BAD_REQUEST, "No PDF uploaded.");
    };

    match super::sweep_expired_jobs(state.jobs_dir(), state.job_retention()).await {
        Ok(0) => {}
        Ok(n) => tracing::info!(removed = n, "swept expired jobs"),
        Err(e) => tracing::warn!(error=?e, "job sweep failed"),
    }

    let job_id = Uuid::new_v4();
    let job_dir = state.jobs_dir().join(job_id.to_string());
    if let Err(e) = tokio::fs::create_dir_all(&job_dir).await {
        tracing::error!(error=?e, "failed to create job dir");
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not create job directory.");
    }

    let mut config = state.base().clone();
    config.dpi = form.dpi;
    config.output_format = form.format;
    config.work_dir = Some(job_dir.clone());

    tracing::info!(%job_id, dpi = form.dpi, format = ?form.format, "starting job");
    match convert_from_bytes(&bytes, &file_name, &config).await {
        Ok(output) => {
            tracing::info!(%job_id, outputs = output.compiled_outputs(), "job finished");
            let downloads = downloads_for(job_id, &output);
            Html(html::result_page(&downloads, &output.compile_errors)).into_response()
        }
        Err(e) => {
            tracing::error!(%job_id, error=%e, "conversion failed");
            let _ = tokio::fs::remove_dir_all(&job_dir).await;
            failure(status_for(&e), &e.to_string())
        }
    }
}

fn downloads_for(job_id: Uuid, output: &ConversionOutput) -> Vec<Download> {
    let href = |path: &FsPath| -> Option<String> {
        let name = path.file_name()?.to_str()?;
        Some(format!("/jobs/{job_id}/{name}"))
    };

    let mut downloads = Vec::new();
    if let Some(h) = href(&output.tex_path) {
        downloads.push(Download {
            label: "LaTeX source",
            href: h,
        });
    }
    if let Some(h) = output.pdf_path.as_deref().and_then(href) {
        downloads.push(Download {
            label: "PDF",
            href: h,
        });
    }
    if let Some(h) = output.docx_path.as_deref().and_then(href) {
        downloads.push(Download {
            label: "Word document",
            href: h,
        });
    }
    downloads
}

/// HTTP status for a fatal conversion error.
pub(crate) fn status_for(e: &Pdf2LatexError) -> StatusCode {
    use Pdf2LatexError::*;
    match e {
        NotAPdf { .. }
        | CorruptPdf { .. }
        | PasswordRequired { .. }
        | WrongPassword { .. }
        | PageOutOfRange { .. }
        | NoPages { .. }
        | InvalidConfig(_) => StatusCode::BAD_REQUEST,
        MissingEnv(_) | ProviderNotConfigured { .. } | PdfiumBindingFailed(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        LayoutApiError { .. }
        | LayoutFailed { .. }
        | LayoutTimeout { .. }
        | LayoutTransport(_)
        | AuthError { .. }
        | LlmFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Html(html::error_page(message))).into_response()
}

fn content_type_for(file: &str) -> Option<&'static str> {
    let ext = FsPath::new(file).extension()?.to_str()?;
    match ext {
        "tex" => Some("application/x-tex"),
        "pdf" => Some("application/pdf"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}

#[tracing::instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path((id, file)): Path<(String, String)>,
) -> Response {
    let Ok(job_id) = Uuid::parse_str(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let stem = &state.base().tex_stem;
    let allowed = ["tex", "pdf", "docx"]
        .iter()
        .any(|ext| file == format!("{stem}.{ext}"));
    let Some(content_type) = content_type_for(&file).filter(|_| allowed) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let path = state.jobs_dir().join(job_id.to_string()).join(&file);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(error=?e, path=%path.display(), "failed to read job file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
