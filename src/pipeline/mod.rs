//! Pipeline stages for PDF-to-LaTeX conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own. [`crate::convert`] strings them together and owns the work dir.
//!
//! ## Data Flow
//!
//! ```text
//! input ─▶ render ─▶ orient ─▶ crop ─▶ render (corrected PDF)
//!   ─▶ layout ─▶ figures ─▶ reading_order ─▶ llm + postprocess ─▶ latex ─▶ compile
//! ```
//!
//! 1. [`input`]  — canonicalise the path, URL or upload to a local file
//! 2. [`render`] — rasterise selected pages and write the corrected PDF;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`orient`] — Tesseract OSD and clockwise rotation
//! 4. [`crop`]   — trim white margins
//! 5. [`encode`] — PNG bytes and files
//! 6. [`layout`] — cloud layout analysis with polling
//! 7. [`figures`] — crop figure regions out of the fixed pages
//! 8. [`reading_order`] — paragraphs and figure markers sorted into text
//! 9. [`llm`] / [`postprocess`] — LaTeX body from the LLM, cleaned
//! 10. [`latex`] — document assembly and `.tex` output
//! 11. [`compile`] — `pdflatex` and `pandoc`

pub mod compile;
pub mod crop;
pub mod encode;
pub mod figures;
pub mod input;
pub mod latex;
pub mod layout;
pub mod llm;
pub mod orient;
pub mod postprocess;
pub mod reading_order;
pub mod render;
