//! Turn the `.tex` source into PDF (`pdflatex`) and Word (`pandoc`).
//!
//! Both tools run inside the work dir so relative `figures/…` paths in the
//! LaTeX resolve. Failures come back as [`CompileError`] values; the caller
//! records them and carries on because the `.tex` is already written.

use crate::error::CompileError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

const COMPILE_TIMEOUT: Duration = Duration::from_secs(300);
/// Lines of output kept in a failure diagnostic.
const TAIL_LINES: usize = 20;

/// Arguments of the `pdflatex` call.
pub fn pdflatex_args(tex_file: &str) -> Vec<String> {
    vec!["-interaction=batchmode".to_string(), tex_file.to_string()]
}

/// Arguments of the `pandoc` call.
pub fn pandoc_args(tex_file: &str, docx_file: &str) -> Vec<String> {
    vec![
        tex_file.to_string(),
        "--from=latex".to_string(),
        "--to=docx".to_string(),
        "--standalone".to_string(),
        format!("--resource-path={}", resource_path()),
        "-o".to_string(),
        docx_file.to_string(),
    ]
}

/// `.`, `images` and `figures` joined by the platform path-list separator.
fn resource_path() -> String {
    let sep = if cfg!(windows) { ";" } else { ":" };
    [".", "images", "figures"].join(sep)
}

/// Compile `<work_dir>/<stem>.tex` to `<stem>.pdf`.
pub async fn compile_pdf(
    pdflatex: &str,
    work_dir: &Path,
    stem: &str,
) -> Result<PathBuf, CompileError> {
    let tex = format!("{stem}.tex");
    let out = work_dir.join(format!("{stem}.pdf"));
    info!("Compiling LaTeX to PDF with {}", pdflatex);
    run_tool(pdflatex, &pdflatex_args(&tex), work_dir).await?;
    expect_output(pdflatex, out)
}

/// Convert `<work_dir>/<stem>.tex` to `<stem>.docx`.
pub async fn convert_docx(
    pandoc: &str,
    work_dir: &Path,
    stem: &str,
) -> Result<PathBuf, CompileError> {
    let tex = format!("{stem}.tex");
    let docx = format!("{stem}.docx");
    let out = work_dir.join(&docx);
    info!("Converting LaTeX to Word with {}", pandoc);
    run_tool(pandoc, &pandoc_args(&tex, &docx), work_dir).await?;
    expect_output(pandoc, out)
}

fn expect_output(tool: &str, path: PathBuf) -> Result<PathBuf, CompileError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(CompileError::MissingOutput {
            tool: tool.to_string(),
            path,
        })
    }
}

async fn run_tool(tool: &str, args: &[String], cwd: &Path) -> Result<(), CompileError> {
    debug!("Running {} {:?} in {}", tool, args, cwd.display());

    let child = Command::new(tool)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CompileError::NotFound {
                    tool: tool.to_string(),
                }
            } else {
                CompileError::Spawn {
                    tool: tool.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

    let output = timeout(COMPILE_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| CompileError::Spawn {
            tool: tool.to_string(),
            detail: format!("timed out after {}s", COMPILE_TIMEOUT.as_secs()),
        })?
        .map_err(|e| CompileError::Spawn {
            tool: tool.to_string(),
            detail: e.to_string(),
        })?;

    if output.status.success() {
        return Ok(());
    }

    // pdflatex in batchmode writes its diagnostics to the log and stdout.
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() {
        tail(&stdout, TAIL_LINES)
    } else {
        tail(&stderr, TAIL_LINES)
    };

    warn!("{} exited with {}", tool, output.status);
    Err(CompileError::Failed {
        tool: tool.to_string(),
        code: output.status.code(),
        stderr: detail,
    })
}

/// Last `n` lines of `s`.
fn tail(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
