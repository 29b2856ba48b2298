//! Post-processing: deterministic cleanup of LLM-generated LaTeX.
//!
//! Even when told to return only the document body, models occasionally wrap
//! the answer in ` ```latex ` fences, repeat the preamble, or emit their own
//! `\begin{document}`. Those would break the assembled document, so they are
//! removed here with cheap string rules. Nothing inside the body is touched
//! beyond whitespace and invisible characters.
//!
//! ## Rule Order
//!
//! Fences are stripped first so the wrapper rules see the first real line.
//! Line endings are normalised before any line-based rule runs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw LLM output and return the body.
///
/// Rules (applied in order):
/// 1. Strip a leading ```` ```lang ```` fence and a trailing ```` ``` ````
/// 2. Normalise line endings (CRLF → LF)
/// 3. Drop `\documentclass`, `\usepackage`, `\begin{document}` and `\end{document}`
/// 4. Trim trailing whitespace per line
/// 5. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 6. Collapse runs of blank lines to a single blank line
/// 7. Trim leading and trailing blank space of the whole body
pub fn clean_latex(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = drop_document_wrapper(&s);
    let s = trim_trailing_whitespace(&s);
    let s = remove_invisible_chars(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip code fences ────────────────────────────────────────────────

static RE_OPEN_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```[a-zA-Z]*\n?").unwrap());
static RE_CLOSE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```$").unwrap());

/// Remove a fence opening the text and a fence closing it.
pub fn strip_code_fences(input: &str) -> String {
    let s = input.trim();
    let s = RE_OPEN_FENCE.replace(s, "");
    let s = RE_CLOSE_FENCE.replace(&s, "");
    s.trim().to_string()
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Drop the document wrapper ────────────────────────────────────────

static RE_PREAMBLE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*\\(?:documentclass|usepackage)(?:\[[^\]]*\])?\{[^}]*\}[ \t]*\n?")
        .unwrap()
});
static RE_DOCUMENT_ENV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:begin|end)\{document\}").unwrap());

fn drop_document_wrapper(input: &str) -> String {
    let s = RE_PREAMBLE_LINE.replace_all(input, "");
    RE_DOCUMENT_ENV.replace_all(&s, "").to_string()
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 6: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}
