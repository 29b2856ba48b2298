//! Full-document conversion entry points.
//!
//! A run walks the stages in order, each writing its artefact into the work
//! dir so an interrupted or surprising run can be inspected afterwards:
//!
//! ```text
//! images/page_N_processed.png   fixed pages
//! corrected.pdf                 fixed pages reassembled
//! analysis.json                 layout result (padded)
//! figures/figure_P_I.png        figure crops
//! output.txt                    reading-order text
//! <stem>.tex / .pdf / .docx     final outputs
//! ```

use crate::config::{AzureOpenAiConfig, ConversionConfig, LayoutServiceConfig};
use crate::error::{PageError, Pdf2LatexError};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::pipeline::{
    compile, crop, encode, figures, input, latex, layout, llm, orient, reading_order, render,
};
use crate::progress::{ConversionProgressCallback, Stage};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default LLM provider when neither config nor environment names one.
pub const DEFAULT_PROVIDER: &str = "azure";
/// Default model / deployment name.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const IMAGES_DIR: &str = "images";
pub const CORRECTED_PDF: &str = "corrected.pdf";
pub const ANALYSIS_JSON: &str = "analysis.json";
pub const OUTPUT_TXT: &str = "output.txt";

/// Convert a PDF file or URL to LaTeX (and PDF / Word per `output_format`).
///
/// # Errors
/// Returns `Err(Pdf2LatexError)` for fatal errors: unreadable input, missing
/// layout credentials, layout or LLM failure, output I/O. Orientation and
/// figure problems are reported per page, compile failures in
/// `compile_errors`.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LatexError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run(resolved.path(), config).await
}

/// Convert PDF bytes held in memory (e.g. an upload).
///
/// The bytes are written to a managed temp dir that is removed on return;
/// the work dir with the outputs is not.
pub async fn convert_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LatexError> {
    let resolved = input::resolve_bytes(bytes, file_name).await?;
    run(resolved.path(), config).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2LatexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2LatexError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Extract PDF metadata without converting content.
///
/// Needs neither layout credentials nor an LLM provider.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2LatexError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    render::extract_metadata(resolved.path(), None).await
}

// ── Pipeline ─────────────────────────────────────────────────────────────

async fn run(pdf_path: &Path, config: &ConversionConfig) -> Result<ConversionOutput, Pdf2LatexError> {
    let total_start = Instant::now();

    // ── Step 1: Credentials, checked before any heavy work ───────────────
    let (layout_config, provider) = resolve_services(config, |k| std::env::var(k).ok())?;

    // ── Step 2: Metadata and page selection ──────────────────────────────
    let metadata = render::extract_metadata(pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        if let Some(page) = config.pages.first_missing_page(total_pages) {
            return Err(Pdf2LatexError::PageOutOfRange {
                page,
                total: total_pages,
            });
        }
        return Err(Pdf2LatexError::NoPages {
            path: pdf_path.to_path_buf(),
        });
    }
    debug!("Selected {} of {} pages", page_indices.len(), total_pages);

    let work_dir = prepare_work_dir(config).await?;
    info!("Working directory: {}", work_dir.display());

    notify(config, |cb| cb.on_conversion_start(page_indices.len()));

    // ── Step 3: Rasterise ────────────────────────────────────────────────
    notify(config, |cb| cb.on_stage_start(Stage::Render));
    let render_start = Instant::now();
    let rendered = render::render_pages(pdf_path, config, &page_indices).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", rendered.len(), render_duration_ms);
    notify(config, |cb| cb.on_stage_complete(Stage::Render));

    // ── Step 4: Orient, crop and save each page ──────────────────────────
    notify(config, |cb| cb.on_stage_start(Stage::FixPages));
    let fix_start = Instant::now();
    let fixed = fix_pages(rendered, config, &work_dir).await?;
    if fixed.is_empty() {
        return Err(Pdf2LatexError::NoPages {
            path: pdf_path.to_path_buf(),
        });
    }
    let (pages, images): (Vec<PageResult>, Vec<DynamicImage>) = fixed.into_iter().unzip();

    let corrected_pdf = work_dir.join(CORRECTED_PDF);
    render::write_image_pdf(images.clone(), config.dpi, &corrected_pdf).await?;
    let fix_duration_ms = fix_start.elapsed().as_millis() as u64;
    notify(config, |cb| cb.on_stage_complete(Stage::FixPages));

    // ── Step 5: Layout analysis ──────────────────────────────────────────
    notify(config, |cb| cb.on_stage_start(Stage::Layout));
    let layout_start = Instant::now();
    let pdf_bytes = tokio::fs::read(&corrected_pdf)
        .await
        .map_err(|e| Pdf2LatexError::Internal(format!("reading {}: {e}", corrected_pdf.display())))?;
    let client = layout::LayoutClient::new(layout_config)?;
    let mut analysis = client.analyze(pdf_bytes).await?;

    let sizes: Vec<(u32, u32)> = images.iter().map(|i| (i.width(), i.height())).collect();
    layout::pad_missing_pages(&mut analysis, &sizes, config.dpi);
    layout::write_analysis_json(&analysis, &work_dir.join(ANALYSIS_JSON)).await?;
    let layout_duration_ms = layout_start.elapsed().as_millis() as u64;
    notify(config, |cb| cb.on_stage_complete(Stage::Layout));

    // ── Step 6: Figures ──────────────────────────────────────────────────
    notify(config, |cb| cb.on_stage_start(Stage::Figures));
    let (figure_crops, figure_errors) =
        figures::extract_figures(&analysis, &images, &work_dir).await?;
    for e in &figure_errors {
        if let PageError::FigureSkipped { page, .. } = e {
            let msg = e.to_string();
            notify(config, |cb| cb.on_page_warning(*page, &msg));
        }
    }
    notify(config, |cb| cb.on_stage_complete(Stage::Figures));
    drop(images);

    // ── Step 7: Reading order ────────────────────────────────────────────
    notify(config, |cb| cb.on_stage_start(Stage::ReadingOrder));
    let elements = reading_order::build_elements(&analysis, &figure_crops);
    let txt_path = work_dir.join(OUTPUT_TXT);
    reading_order::write_text(&elements, &txt_path).await?;
    notify(config, |cb| cb.on_stage_complete(Stage::ReadingOrder));

    // ── Step 8: LaTeX ────────────────────────────────────────────────────
    notify(config, |cb| cb.on_stage_start(Stage::Latex));
    let llm_start = Instant::now();
    let text = latex::read_text_file(&txt_path).await?;
    let generation = llm::generate_latex(&provider, &text, config).await?;
    let document = latex::assemble_document(&generation.body);
    let tex_path = work_dir.join(format!("{}.tex", config.tex_stem));
    latex::write_tex(&document, &tex_path).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
    notify(config, |cb| cb.on_stage_complete(Stage::Latex));

    // ── Step 9: Compile ──────────────────────────────────────────────────
    let compile_start = Instant::now();
    let mut compile_errors = Vec::new();
    let mut pdf_path_out = None;
    let mut docx_path_out = None;

    if config.output_format.wants_pdf() {
        notify(config, |cb| cb.on_stage_start(Stage::CompilePdf));
        match compile::compile_pdf(&config.tools.pdflatex, &work_dir, &config.tex_stem).await {
            Ok(p) => pdf_path_out = Some(p),
            Err(e) => {
                warn!("PDF compilation failed: {}", e);
                compile_errors.push(e);
            }
        }
        notify(config, |cb| cb.on_stage_complete(Stage::CompilePdf));
    }

    if config.output_format.wants_docx() {
        notify(config, |cb| cb.on_stage_start(Stage::ConvertDocx));
        match compile::convert_docx(&config.tools.pandoc, &work_dir, &config.tex_stem).await {
            Ok(p) => docx_path_out = Some(p),
            Err(e) => {
                warn!("Word conversion failed: {}", e);
                compile_errors.push(e);
            }
        }
        notify(config, |cb| cb.on_stage_complete(Stage::ConvertDocx));
    }
    let compile_duration_ms = compile_start.elapsed().as_millis() as u64;

    // ── Step 10: Stats ───────────────────────────────────────────────────
    let stats = ConversionStats {
        total_pages,
        processed_pages: pages.len(),
        orientation_skipped: pages.iter().filter(|p| p.error.is_some()).count(),
        paragraphs: analysis.paragraphs.len(),
        figures: figure_crops.len(),
        input_tokens: generation.input_tokens,
        output_tokens: generation.output_tokens,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        fix_duration_ms,
        layout_duration_ms,
        llm_duration_ms,
        compile_duration_ms,
    };

    let output = ConversionOutput {
        work_dir,
        tex_path,
        latex: document,
        pdf_path: pdf_path_out,
        docx_path: docx_path_out,
        pages,
        figures: figure_crops,
        figure_errors,
        compile_errors,
        metadata,
        stats,
    };

    info!(
        "Conversion complete: {} pages, {} figures, {} compiled outputs, {}ms total",
        output.stats.processed_pages,
        output.stats.figures,
        output.compiled_outputs(),
        output.stats.total_duration_ms
    );
    notify(config, |cb| cb.on_conversion_complete(page_indices.len(), output.compiled_outputs()));

    Ok(output)
}

fn notify(config: &ConversionConfig, f: impl FnOnce(&dyn ConversionProgressCallback)) {
    if let Some(ref cb) = config.progress_callback {
        f(cb.as_ref());
    }
}

/// Create the work dir and its `images/` and `figures/` subdirectories.
async fn prepare_work_dir(config: &ConversionConfig) -> Result<PathBuf, Pdf2LatexError> {
    let dir = match &config.work_dir {
        Some(d) => d.clone(),
        None => tempfile::Builder::new()
            .prefix("pdf2latex_")
            .tempdir()
            .map_err(|e| Pdf2LatexError::Internal(format!("tempdir: {e}")))?
            .keep(),
    };

    for sub in [IMAGES_DIR, figures::FIGURES_DIR] {
        let path = dir.join(sub);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| Pdf2LatexError::OutputWriteFailed { path, source })?;
    }
    Ok(dir)
}

/// Fix every rendered page, up to `config.concurrency` at once.
///
/// Results come back ordered by page number.
async fn fix_pages(
    rendered: Vec<(usize, DynamicImage)>,
    config: &ConversionConfig,
    work_dir: &Path,
) -> Result<Vec<(PageResult, DynamicImage)>, Pdf2LatexError> {
    let total_pages = rendered.len();

    let results: Vec<Result<(PageResult, DynamicImage), Pdf2LatexError>> =
        stream::iter(rendered.into_iter().map(|(idx, img)| async move {
            let fixed = fix_page(idx + 1, img, config, work_dir).await?;
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_fixed(fixed.0.page_num, total_pages, fixed.0.rotation);
                if let Some(ref e) = fixed.0.error {
                    cb.on_page_warning(fixed.0.page_num, &e.to_string());
                }
            }
            Ok::<_, Pdf2LatexError>(fixed)
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    let mut fixed = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    fixed.sort_by_key(|(p, _)| p.page_num);
    Ok(fixed)
}

/// Orient, crop and save one page.
async fn fix_page(
    page_num: usize,
    img: DynamicImage,
    config: &ConversionConfig,
    work_dir: &Path,
) -> Result<(PageResult, DynamicImage), Pdf2LatexError> {
    let (rotation, error) = if config.detect_orientation {
        match orient::detect_orientation(&config.tools.tesseract, &img).await {
            Ok(info) => (info.rotate, None),
            Err(detail) => {
                warn!("Page {}: orientation detection skipped: {}", page_num, detail);
                (0, Some(PageError::OrientationSkipped {
                    page: page_num,
                    detail,
                }))
            }
        }
    } else {
        (0, None)
    };

    if rotation != 0 {
        debug!("Page {}: rotating {}° clockwise", page_num, rotation);
    }

    let (threshold, pad) = (config.white_threshold, config.pad_px);
    let (img, crop_box) = tokio::task::spawn_blocking(move || {
        let img = orient::apply_rotation(img, rotation);
        crop::crop_to_content(img, threshold, pad)
    })
    .await
    .map_err(|e| Pdf2LatexError::Internal(format!("Crop task panicked: {e}")))?;

    let image_path = work_dir
        .join(IMAGES_DIR)
        .join(format!("page_{page_num}_processed.png"));
    encode::save_png(img.clone(), &image_path).await?;

    let result = PageResult {
        page_num,
        rotation,
        crop: crop_box,
        width: img.width(),
        height: img.height(),
        image_path,
        error,
    };
    Ok((result, img))
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pdf2LatexError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2LatexError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the layout service and the LLM provider, reporting every
/// missing environment variable in one [`Pdf2LatexError::MissingEnv`].
///
/// The LLM provider is resolved from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Azure** (the default name): deployment `model` on the resource from
///    `config.azure_openai`, else `AZURE_ENDPOINT` / `OPENAI_API_KEY` /
///    `OPENAI_API_VERSION`.
/// 3. **Any other name**: the factory reads that provider's own credentials.
///
/// The name comes from `config.provider_name`, then `PDF2LATEX_LLM_PROVIDER`,
/// then `azure`; the model from `config.model`, then `AZURE_MODEL_NAME`, then
/// `gpt-4o-mini`.
fn resolve_services(
    config: &ConversionConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(LayoutServiceConfig, Arc<dyn LLMProvider>), Pdf2LatexError> {
    let (name, model) = provider_choice(config, &env);
    let wants_azure = config.provider.is_none() && is_azure(&name);

    let azure = match (&config.azure_openai, wants_azure) {
        (Some(a), true) => Some(Ok(a.clone())),
        (None, true) => Some(AzureOpenAiConfig::from_lookup(&env)),
        (_, false) => None,
    };
    let layout = match &config.layout {
        Some(l) => Ok(l.clone()),
        None => LayoutServiceConfig::from_lookup(&env),
    };

    let mut missing = Vec::new();
    if let Some(Err(Pdf2LatexError::MissingEnv(names))) = &azure {
        missing.extend(names.iter().cloned());
    }
    if let Err(Pdf2LatexError::MissingEnv(names)) = &layout {
        missing.extend(names.iter().cloned());
    }
    if !missing.is_empty() {
        return Err(Pdf2LatexError::MissingEnv(missing));
    }
    let layout = layout?;

    let provider: Arc<dyn LLMProvider> = match (&config.provider, azure) {
        (Some(provider), _) => Arc::clone(provider),
        (None, Some(azure)) => {
            let azure = azure?;
            info!("Using Azure OpenAI deployment '{}' at {}", model, azure.endpoint);
            Arc::new(azure.provider(&model))
        }
        (None, None) => {
            info!("Using LLM provider '{}' with model '{}'", name, model);
            create_provider(&name, &model)?
        }
    };
    Ok((layout, provider))
}

fn is_azure(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "azure" | "azure-openai" | "azure_openai" | "azureopenai"
    )
}

/// Pick provider and model names from config, then environment, then defaults.
fn provider_choice(
    config: &ConversionConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> (String, String) {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let name = config
        .provider_name
        .clone()
        .or_else(|| non_empty(env("PDF2LATEX_LLM_PROVIDER")))
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
    let model = config
        .model
        .clone()
        .or_else(|| non_empty(env("AZURE_MODEL_NAME")))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    (name, model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_defaults() {
        let (name, model) = provider_choice(&ConversionConfig::default(), &|_: &str| None);
        assert_eq!(name, "azure");
        assert_eq!(model, "gpt-4o-mini");
    }

    #[test]
    fn provider_env_then_config() {
        let env = |k: &str| match k {
            "PDF2LATEX_LLM_PROVIDER" => Some("openai".to_string()),
            "AZURE_MODEL_NAME" => Some("gpt-4o".to_string()),
            _ => None,
        };
        let (name, model) = provider_choice(&ConversionConfig::default(), &env);
        assert_eq!((name.as_str(), model.as_str()), ("openai", "gpt-4o"));

        let config = ConversionConfig::builder()
            .provider_name("anthropic")
            .model("claude-sonnet-4-20250514")
            .build()
            .unwrap();
        let (name, model) = provider_choice(&config, &env);
        assert_eq!(name, "anthropic");
        assert_eq!(model, "claude-sonnet-4-20250514");
    }

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k| vars.iter().find(|(n, _)| *n == k).map(|(_, v)| v.to_string())
    }

    const ORIGINAL_ENV: &[(&str, &str)] = &[
        ("AZURE_ENDPOINT", "https://exam.openai.azure.com"),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_API_VERSION", "2024-08-01-preview"),
        ("AZURE_MODEL_NAME", "gpt-4o"),
        ("DOC_INTELLIGENCE_ENDPOINT", "https://exam.cognitiveservices.azure.com"),
        ("DOC_INTELLIGENCE_KEY", "di-test"),
    ];

    #[test]
    fn azure_deployment_from_original_variables() {
        let (layout, provider) =
            resolve_services(&ConversionConfig::default(), lookup(ORIGINAL_ENV)).unwrap();
        assert_eq!(layout.endpoint, "https://exam.cognitiveservices.azure.com");
        assert_eq!(provider.name(), "azure-openai");
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn every_missing_variable_reported_together() {
        let err = resolve_services(&ConversionConfig::default(), |_| None).err().unwrap();
        match err {
            Pdf2LatexError::MissingEnv(names) => assert_eq!(
                names,
                vec![
                    "AZURE_ENDPOINT",
                    "OPENAI_API_KEY",
                    "OPENAI_API_VERSION",
                    "DOC_INTELLIGENCE_ENDPOINT",
                    "DOC_INTELLIGENCE_KEY",
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prebuilt_provider_skips_azure_variables() {
        let config = ConversionConfig::builder()
            .provider(Arc::new(edgequake_llm::MockProvider::new()))
            .build()
            .unwrap();
        let err = resolve_services(&config, lookup(&[("DOC_INTELLIGENCE_KEY", "di-test")]))
            .err().unwrap();
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: DOC_INTELLIGENCE_ENDPOINT"
        );

        let config = ConversionConfig::builder()
            .provider(Arc::new(edgequake_llm::MockProvider::new()))
            .layout(LayoutServiceConfig::new("https://x.example", "k"))
            .build()
            .unwrap();
        let (_, provider) = resolve_services(&config, |_| None).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn explicit_azure_config_wins_over_environment() {
        let config = ConversionConfig::builder()
            .azure_openai(AzureOpenAiConfig {
                endpoint: "https://other.openai.azure.com".into(),
                api_key: "k".into(),
                api_version: "2024-10-21".into(),
            })
            .model("exam-4o")
            .layout(LayoutServiceConfig::new("https://x.example", "k"))
            .build()
            .unwrap();
        let (_, provider) = resolve_services(&config, |_| None).unwrap();
        assert_eq!(provider.model(), "exam-4o");
    }

    #[test]
    fn azure_name_variants() {
        assert!(is_azure("Azure"));
        assert!(is_azure("azure-openai"));
        assert!(!is_azure("openai"));
    }

    #[test]
    fn blank_env_falls_back() {
        let (name, _) = provider_choice(&ConversionConfig::default(), &|_: &str| Some("  ".into()));
        assert_eq!(name, "azure");
    }

    #[tokio::test]
    async fn work_dir_gets_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .work_dir(dir.path().join("job"))
            .build()
            .unwrap();
        let wd = prepare_work_dir(&config).await.unwrap();
        assert!(wd.join("images").is_dir());
        assert!(wd.join("figures").is_dir());
    }

    #[tokio::test]
    async fn fix_page_without_orientation_crops_and_saves() {
        use image::{Luma, GrayImage};

        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .detect_orientation(false)
            .pad_px(2)
            .work_dir(dir.path())
            .build()
            .unwrap();
        prepare_work_dir(&config).await.unwrap();

        let mut page = GrayImage::from_pixel(60, 40, Luma([255]));
        for y in 10..20 {
            for x in 20..30 {
                page.put_pixel(x, y, Luma([0]));
            }
        }
        let (result, img) = fix_page(3, DynamicImage::ImageLuma8(page), &config, dir.path())
            .await
            .unwrap();

        assert_eq!(result.page_num, 3);
        assert_eq!(result.rotation, 0);
        assert!(result.error.is_none());
        assert_eq!((result.width, result.height), (img.width(), img.height()));
        assert_eq!((result.width, result.height), (13, 13));
        assert!(dir.path().join("images").join("page_3_processed.png").is_file());
    }

    #[tokio::test]
    async fn missing_tesseract_is_a_page_warning() {
        use image::{Rgba, RgbaImage};

        let dir = tempfile::tempdir().unwrap();
        let mut tools = crate::config::ToolPaths::default();
        tools.tesseract = "no-such-tesseract-xyz".into();
        let config = ConversionConfig::builder()
            .tools(tools)
            .work_dir(dir.path())
            .build()
            .unwrap();
        prepare_work_dir(&config).await.unwrap();

        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])));
        let (result, _) = fix_page(1, img, &config, dir.path()).await.unwrap();
        assert!(matches!(
            result.error,
            Some(PageError::OrientationSkipped { page: 1, .. })
        ));
        // Blank page: no crop applied.
        assert!(result.crop.is_none());
    }
}
