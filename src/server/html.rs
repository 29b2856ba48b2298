//! Server-rendered pages. Kept plain so the UI works without JavaScript.

use crate::error::CompileError;

pub const UI_MIN_DPI: u32 = 100;
pub const UI_MAX_DPI: u32 = 600;
pub const UI_DPI_STEP: u32 = 50;
pub const UI_DEFAULT_DPI: u32 = 300;

const STYLE: &str = "body{font-family:sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin:1rem 0 .3rem}\
.error{color:#b00020;white-space:pre-wrap}\
.muted{color:#666}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Upload form.
pub fn index_page() -> String {
    let body = format!(
        r#"<h1>PDF → LaTeX → PDF/Word Converter</h1>
<form action="/convert" method="post" enctype="multipart/form-data">
<label for="dpi">Image resolution (DPI): <output id="dpi-value">{default}</output></label>
<input type="range" id="dpi" name="dpi" min="{min}" max="{max}" step="{step}" value="{default}"
 oninput="document.getElementById('dpi-value').value=this.value">
<label>Output format</label>
<input type="radio" id="fmt-pdf" name="format" value="pdf" checked><label for="fmt-pdf" style="display:inline">PDF</label>
<input type="radio" id="fmt-docx" name="format" value="docx"><label for="fmt-docx" style="display:inline">Word (.docx)</label>
<input type="radio" id="fmt-both" name="format" value="both"><label for="fmt-both" style="display:inline">Both</label>
<label for="file">Upload PDF</label>
<input type="file" id="file" name="file" accept="application/pdf,.pdf" required>
<p><button type="submit">Convert</button></p>
</form>
<p class="muted">Conversion runs while the request is open and may take a few minutes.</p>"#,
        min = UI_MIN_DPI,
        max = UI_MAX_DPI,
        step = UI_DPI_STEP,
        default = UI_DEFAULT_DPI,
    );
    page("PDF → LaTeX", &body)
}

/// A downloadable artefact of a finished job.
pub struct Download {
    pub label: &'static str,
    pub href: String,
}

/// Result page of a finished job.
pub fn result_page(downloads: &[Download], compile_errors: &[CompileError]) -> String {
    let mut body = String::from("<h1>Conversion finished</h1>\n<ul>\n");
    for d in downloads {
        body.push_str(&format!(
            "<li><a href=\"{}\" download>Download {}</a></li>\n",
            escape(&d.href),
            escape(d.label)
        ));
    }
    body.push_str("</ul>\n");

    for e in compile_errors {
        body.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            escape(&compile_error_message(e))
        ));
    }
    body.push_str("<p><a href=\"/\">Convert another file</a></p>");
    page("Conversion finished", &body)
}

/// Error page with a short message.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>Conversion failed</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>",
        escape(message)
    );
    page("Conversion failed", &body)
}

fn compile_error_message(e: &CompileError) -> String {
    match e {
        CompileError::NotFound { tool } if tool == "pdflatex" => {
            "`pdflatex` not found. Install TeX Live or MiKTeX and add it to your PATH.".to_string()
        }
        CompileError::NotFound { tool } => format!("`{tool}` not found."),
        other => other.to_string(),
    }
}

/// Minimal HTML text escaping.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_has_dpi_slider_and_format_choices() {
        let html = index_page();
        assert!(html.contains(r#"min="100" max="600" step="50" value="300""#));
        assert!(html.contains(r#"value="pdf" checked"#));
        assert!(html.contains("Word (.docx)"));
        assert!(html.contains(r#"name="file""#));
    }

    #[test]
    fn result_page_lists_downloads_and_tool_errors() {
        let downloads = [Download {
            label: "LaTeX",
            href: "/jobs/x/paper_itl_final.tex".into(),
        }];
        let errors = [
            CompileError::NotFound {
                tool: "pdflatex".into(),
            },
            CompileError::NotFound {
                tool: "pandoc".into(),
            },
        ];
        let html = result_page(&downloads, &errors);
        assert!(html.contains("/jobs/x/paper_itl_final.tex"));
        assert!(html.contains("Install TeX Live or MiKTeX"));
        assert!(html.contains("`pandoc` not found."));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
