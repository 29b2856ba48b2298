//! LaTeX document assembly around the generated body.

use crate::error::Pdf2LatexError;
use std::path::Path;
use tracing::info;

/// Lines placed before the body.
pub const PREAMBLE: [&str; 3] = [
    r"\documentclass{article}",
    r"\usepackage{amsmath, amssymb, physics, graphicx, float, enumitem}",
    r"\begin{document}",
];

pub const POSTAMBLE: &str = r"\end{document}";

/// Wrap a cleaned body into a complete document, lines joined by `\n`.
pub fn assemble_document(body: &str) -> String {
    let mut lines: Vec<&str> = PREAMBLE.to_vec();
    lines.push(body);
    lines.push(POSTAMBLE);
    lines.join("\n")
}

/// Read the reading-order text that feeds the LLM.
///
/// Missing files and whitespace-only content are errors: an empty prompt
/// would make the model invent a document.
pub async fn read_text_file(path: &Path) -> Result<String, Pdf2LatexError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Pdf2LatexError::TextFileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(Pdf2LatexError::Internal(format!(
                "reading {}: {e}",
                path.display()
            )))
        }
    };

    if content.trim().is_empty() {
        return Err(Pdf2LatexError::EmptyText {
            path: path.to_path_buf(),
        });
    }
    Ok(content)
}

/// Write the assembled document to `path`.
pub async fn write_tex(document: &str, path: &Path) -> Result<(), Pdf2LatexError> {
    tokio::fs::write(path, document)
        .await
        .map_err(|source| Pdf2LatexError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    info!("LaTeX written to {}", path.display());
    Ok(())
}
