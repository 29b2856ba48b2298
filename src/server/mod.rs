//! Upload web UI: a form that takes a PDF, runs the conversion and links
//! the results.
//!
//! Each request gets its own job directory `<jobs_dir>/<uuid>/`, which is the
//! conversion's work dir. Downloads are served only from there and only for
//! the `.tex`, `.pdf` and `.docx` outputs. Job directories older than the
//! retention period are swept at startup and before each new job.

mod handlers;
mod html;

use crate::config::ConversionConfig;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default listen address of the container.
pub const DEFAULT_BIND: &str = "0.0.0.0:8501";
/// Default upload size limit: 64 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;
/// Default lifetime of a job directory: 24 hours.
pub const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Settings of the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Root under which job directories are created.
    pub jobs_dir: PathBuf,
    /// Maximum request body size in bytes.
    pub body_limit: usize,
    /// Job directories last modified longer ago than this are deleted.
    pub job_retention: Duration,
    /// Template for every job; `dpi`, `output_format` and `work_dir` are
    /// overridden per request.
    pub base: ConversionConfig,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    jobs_dir: PathBuf,
    job_retention: Duration,
    base: ConversionConfig,
}

impl AppState {
    pub fn new(jobs_dir: PathBuf, job_retention: Duration, base: ConversionConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                jobs_dir,
                job_retention,
                base,
            }),
        }
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.inner.jobs_dir
    }

    pub fn job_retention(&self) -> Duration {
        self.inner.job_retention
    }

    pub fn base(&self) -> &ConversionConfig {
        &self.inner.base
    }
}

/// Build the application router.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/convert", post(handlers::convert))
        .route("/jobs/:id/:file", get(handlers::download))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.jobs_dir).await?;
    let swept = sweep_expired_jobs(&config.jobs_dir, config.job_retention).await?;
    if swept > 0 {
        info!("Removed {} expired job directories", swept);
    }
    let state = AppState::new(config.jobs_dir.clone(), config.job_retention, config.base);
    let app = router(state, config.body_limit);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        "Listening on http://{} (jobs in {})",
        config.bind,
        config.jobs_dir.display()
    );
    axum::serve(listener, app).await
}

/// Delete job directories under `jobs_dir` not modified for `max_age`.
///
/// Only directories named by a UUID are touched. Returns how many were removed.
pub async fn sweep_expired_jobs(jobs_dir: &Path, max_age: Duration) -> std::io::Result<usize> {
    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(jobs_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_job = entry
            .file_name()
            .to_str()
            .is_some_and(|name| Uuid::parse_str(name).is_ok());
        if !is_job {
            continue;
        }
        let meta = entry.metadata().await?;
        let age = meta
            .modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .unwrap_or_default();
        if !meta.is_dir() || age < max_age {
            continue;
        }
        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => {
                debug!("Removed expired job {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Failed to remove {}: {}", entry.path().display(), e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sweep_removes_only_expired_job_dirs() {
        let root = tempfile::tempdir().unwrap();
        let job = root.path().join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(job.join("figures")).unwrap();
        std::fs::write(job.join("paper_itl_final.tex"), "\\documentclass{article}").unwrap();
        std::fs::create_dir(root.path().join("not-a-job")).unwrap();

        // Fresh jobs survive a day-long retention.
        assert_eq!(sweep_expired_jobs(root.path(), DEFAULT_JOB_RETENTION).await.unwrap(), 0);
        assert!(job.exists());

        assert_eq!(sweep_expired_jobs(root.path(), Duration::ZERO).await.unwrap(), 1);
        assert!(!job.exists());
        assert!(root.path().join("not-a-job").exists());
    }

    #[tokio::test]
    async fn sweep_of_missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(sweep_expired_jobs(&root.path().join("absent"), Duration::ZERO)
            .await
            .is_err());
    }
}
