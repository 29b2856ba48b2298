//! Locate the external programs the pipeline and its container rely on.

use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Programs expected on `PATH`.
pub const REQUIRED_TOOLS: &[&str] = &[
    "pdflatex",
    "latexmk",
    "pandoc",
    "pdftoppm",
    "pdftotext",
    "gs",
    "tesseract",
];

/// Lookup result for one program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStatus {
    pub name: String,
    pub path: Option<PathBuf>,
}

/// Result of [`check_toolchain`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolchainReport {
    pub tools: Vec<ToolStatus>,
}

impl ToolchainReport {
    pub fn missing(&self) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|t| t.path.is_none())
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.tools.iter().all(|t| t.path.is_some())
    }
}

/// Look up every program of [`REQUIRED_TOOLS`] on the current `PATH`.
pub fn check_toolchain() -> ToolchainReport {
    let path = std::env::var_os("PATH").unwrap_or_default();
    check_tools_in(REQUIRED_TOOLS, &path)
}

/// Look up `names` in a `PATH`-style list of directories.
pub fn check_tools_in(names: &[&str], path_var: &OsStr) -> ToolchainReport {
    let dirs: Vec<PathBuf> = std::env::split_paths(path_var).collect();
    let tools = names
        .iter()
        .map(|name| ToolStatus {
            name: name.to_string(),
            path: dirs.iter().find_map(|d| executable_in(d, name)),
        })
        .collect();
    ToolchainReport { tools }
}

fn executable_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(name);
    if is_executable(&candidate) {
        return Some(candidate);
    }
    if cfg!(windows) {
        let exe = dir.join(format!("{name}.exe"));
        if exe.is_file() {
            return Some(exe);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
