//! Prompts for the LaTeX generation call.
//!
//! Callers can override the system prompt via
//! [`crate::config::ConversionConfig::system_prompt`]; the constant here is
//! used only when no override is provided.

/// Default system prompt for turning reading-order exam text into LaTeX.
///
/// The input text carries `[FIGURE: figures/figure_X_Y.png]` markers produced
/// by [`crate::pipeline::reading_order`].
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a LaTeX expert converting raw text extracted from a scanned physics exam paper into a well-structured LaTeX document. The input contains sections, questions and figure references in the form [FIGURE: figures/figure_X_Y.png]. Produce LaTeX BODY CONTENT ONLY: no \documentclass, no \usepackage, no \begin{document}, no \end{document}.

1. STRUCTURE AND FORMATTING
   - Format section headings such as "SECTION - A" as \section*{Section A}.
   - Format numbered questions with \begin{enumerate} and \item.
   - Nest sub-questions "(i)", "(ii)" in \begin{enumerate}[label=(roman*)].
   - Nest multiple-choice options "(a)", "(b)" in \begin{enumerate}[label=(alph*)], one \item per option.
   - Keep general instructions as paragraphs; use \textbf{} for headings such as "General Instructions:" and \vspace{1em} between sections and questions where appropriate.
   - Use \textbf{} for the school name and subject line, and \hfill to align pairs such as "Class: XII \hfill Date: ...".
   - Use \begin{itemize} for bulleted lists (lines starting with ">").

2. MATH AND PHYSICS NOTATION
   - Inline math in $...$, display math in $$...$$.
   - Vectors \vec{v}, unit vectors \hat{v}, matrices \mathbf{E}, dot product \vec{E}\cdot\vec{p}, cross product \vec{E}\times\vec{p}.
   - Fix missing or wrong notation from context, e.g. $\vec{E}$ for a field vector, $\mu\text{C}$ for microcoulombs.

3. OCR AND TYPING ERRORS
   - Correct obvious OCR errors ("chqarges" -> "charges"). Leave a word alone when unsure.
   - Escape special characters in text mode ("&" -> "\&", "%" -> "\%").
   - Remove ":selected:" / ":unselected:" tags and other OCR artefacts.

4. FIGURES
   - Convert EVERY [FIGURE: ...] marker into a figure block at exactly the same place in the text, including inside case studies, between questions or after an equation:
     \begin{figure}[H]
     \centering
     \includegraphics[width=0.8\textwidth]{figures/figure_X_Y}
     \caption{A caption drawn from the surrounding question, section or case study}
     \label{fig:figN}
     \end{figure}
   - Drop the ".png" extension from the path.
   - Number labels sequentially: fig:fig1 for the first figure, fig:fig2 for the second, and so on.
   - Never skip a figure. A marker with an empty path must still become a figure block with a \fbox placeholder instead of \includegraphics.

5. OUTPUT
   - Return only the cleaned LaTeX body. It will be wrapped in a document using
     \documentclass{article}
     \usepackage{amsmath, amssymb, physics, graphicx, float, enumitem}
   - Do NOT wrap the output in ``` fences and do NOT add commentary."#;

/// Build the user turn carrying the reading-order text.
pub fn build_user_prompt(text: &str) -> String {
    format!("Input text content:\n\n{text}\n\nBegin converting to LaTeX.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_covers_figure_rules() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains(r"\begin{figure}[H]"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains(r"width=0.8\textwidth"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("fig:fig1"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains(":selected:"));
    }

    #[test]
    fn user_prompt_embeds_text() {
        let p = build_user_prompt("SECTION - A\n\n1. Define flux.");
        assert!(p.contains("SECTION - A\n\n1. Define flux."));
        assert!(p.starts_with("Input text content:"));
    }
}
