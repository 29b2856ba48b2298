//! Integration tests for the network and file stages, with the layout
//! service mocked by httpmock. No pdfium, Tesseract or LLM needed.

use httpmock::prelude::*;
use image::{DynamicImage, Rgb, RgbImage};
use pdf2latex::pipeline::figures::extract_figures;
use pdf2latex::pipeline::latex::{assemble_document, read_text_file, write_tex};
use pdf2latex::pipeline::layout::{pad_missing_pages, write_analysis_json, AnalyzeResult, LayoutClient};
use pdf2latex::pipeline::postprocess::clean_latex;
use pdf2latex::pipeline::reading_order::{build_elements, write_text};
use pdf2latex::{LayoutServiceConfig, Pdf2LatexError};
use serde_json::json;
use tempfile::TempDir;

const ANALYZE_PATH: &str = "/documentintelligence/documentModels/prebuilt-layout:analyze";

fn layout_config(server: &MockServer) -> LayoutServiceConfig {
    LayoutServiceConfig::new(server.base_url(), "test-key")
        .with_poll_interval_ms(10)
        .with_max_polls(3)
}

/// Two-page exam: a figure between two questions on page 1, one paragraph
/// on page 2. Pages are 2 × 4 in.
fn exam_result() -> serde_json::Value {
    json!({
        "apiVersion": "2024-11-30",
        "modelId": "prebuilt-layout",
        "pages": [
            { "pageNumber": 1, "angle": 0.0, "width": 2.0, "height": 4.0, "unit": "inch", "words": [], "lines": [] },
            { "pageNumber": 2, "angle": 0.0, "width": 2.0, "height": 4.0, "unit": "inch", "words": [], "lines": [] }
        ],
        "paragraphs": [
            {
                "content": "Question 2: Explain the graph.",
                "boundingRegions": [{ "pageNumber": 1, "polygon": [0.1, 2.9, 1.9, 2.9, 1.9, 3.1, 0.1, 3.1] }]
            },
            {
                "content": "Question 3: Define momentum.",
                "boundingRegions": [{ "pageNumber": 2, "polygon": [0.1, 0.4, 1.9, 0.4, 1.9, 0.6, 0.1, 0.6] }]
            },
            {
                "content": "Question 1: State Newton's first law.",
                "boundingRegions": [{ "pageNumber": 1, "polygon": [0.1, 0.4, 1.9, 0.4, 1.9, 0.6, 0.1, 0.6] }]
            }
        ],
        "figures": [
            {
                "id": "1.1",
                "boundingRegions": [{ "pageNumber": 1, "polygon": [0.5, 1.0, 1.5, 1.0, 1.5, 2.0, 0.5, 2.0] }]
            }
        ]
    })
}

fn page_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 400, Rgb([255, 255, 255])))
}

#[tokio::test]
async fn analyze_submits_then_polls_until_succeeded() {
    let server = MockServer::start_async().await;

    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(ANALYZE_PATH)
                .query_param("api-version", "2024-11-30")
                .header("Ocp-Apim-Subscription-Key", "test-key")
                .body("%PDF-1.7 fake");
            then.status(202)
                .header("Operation-Location", server.url("/operations/42"));
        })
        .await;

    let poll = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/operations/42")
                .header("Ocp-Apim-Subscription-Key", "test-key");
            then.status(200)
                .json_body(json!({ "status": "succeeded", "analyzeResult": exam_result() }));
        })
        .await;

    let client = LayoutClient::new(layout_config(&server)).unwrap();
    let result = client.analyze(b"%PDF-1.7 fake".to_vec()).await.unwrap();

    submit.assert_async().await;
    poll.assert_async().await;
    assert_eq!(result.pages.len(), 2);
    assert_eq!(result.paragraphs.len(), 3);
    assert_eq!(result.figures.len(), 1);
    assert_eq!(result.extra["modelId"], "prebuilt-layout");
}

#[tokio::test]
async fn analyze_gives_up_after_max_polls() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(202)
                .header("Operation-Location", server.url("/operations/slow"));
        })
        .await;
    let poll = server
        .mock_async(|when, then| {
            when.method(GET).path("/operations/slow");
            then.status(200).json_body(json!({ "status": "running" }));
        })
        .await;

    let client = LayoutClient::new(layout_config(&server)).unwrap();
    let err = client.analyze(b"%PDF".to_vec()).await.unwrap_err();

    assert!(matches!(err, Pdf2LatexError::LayoutTimeout { polls: 3 }), "{err}");
    poll.assert_hits_async(3).await;
}

#[tokio::test]
async fn analyze_reports_failed_operation() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(202)
                .header("Operation-Location", server.url("/operations/bad"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/operations/bad");
            then.status(200).json_body(json!({
                "status": "failed",
                "error": { "code": "InvalidContent", "message": "The file is corrupted." }
            }));
        })
        .await;

    let client = LayoutClient::new(layout_config(&server)).unwrap();
    match client.analyze(b"%PDF".to_vec()).await.unwrap_err() {
        Pdf2LatexError::LayoutFailed { detail } => assert!(detail.contains("InvalidContent")),
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn analyze_maps_http_errors() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path(ANALYZE_PATH).header("Ocp-Apim-Subscription-Key", "bad-key");
            then.status(401).body("Access denied due to invalid subscription key.");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ANALYZE_PATH).header("Ocp-Apim-Subscription-Key", "test-key");
            then.status(400).body("{\"error\":{\"code\":\"InvalidRequest\"}}");
        })
        .await;

    let bad_key = LayoutServiceConfig::new(server.base_url(), "bad-key");
    let err = LayoutClient::new(bad_key).unwrap().analyze(b"%PDF".to_vec()).await.unwrap_err();
    assert!(matches!(err, Pdf2LatexError::AuthError { .. }), "{err}");

    let err = LayoutClient::new(layout_config(&server))
        .unwrap()
        .analyze(b"%PDF".to_vec())
        .await
        .unwrap_err();
    match err {
        Pdf2LatexError::LayoutApiError { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("InvalidRequest"));
        }
        other => panic!("unexpected: {other}"),
    }
}

#[tokio::test]
async fn analyze_without_operation_location_fails() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(ANALYZE_PATH);
            then.status(202);
        })
        .await;

    let client = LayoutClient::new(layout_config(&server)).unwrap();
    let err = client.analyze(b"%PDF".to_vec()).await.unwrap_err();
    assert!(matches!(err, Pdf2LatexError::LayoutFailed { .. }), "{err}");
}

#[tokio::test]
async fn layout_to_reading_order_text() {
    let dir = TempDir::new().unwrap();
    let work = dir.path();
    tokio::fs::create_dir_all(work.join("figures")).await.unwrap();

    let mut layout: AnalyzeResult = serde_json::from_value(exam_result()).unwrap();
    // A third page the service did not report.
    pad_missing_pages(&mut layout, &[(200, 400), (200, 400), (200, 400)], 100);
    assert_eq!(layout.pages.len(), 3);
    assert_eq!(layout.pages[2].page_number, 3);

    write_analysis_json(&layout, &work.join("analysis.json")).await.unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(work.join("analysis.json")).unwrap()).unwrap();
    assert_eq!(saved["figures"][0]["id"], "1.1");

    let images = vec![page_image(), page_image(), page_image()];
    let (figures, skipped) = extract_figures(&layout, &images, work).await.unwrap();
    assert!(skipped.is_empty());
    assert_eq!(figures.len(), 1);
    assert_eq!((figures[0].bbox.x1, figures[0].bbox.y1), (50, 100));
    assert_eq!((figures[0].bbox.width(), figures[0].bbox.height()), (100, 100));

    let crop = image::open(work.join("figures/figure_1_0.png")).unwrap();
    assert_eq!((crop.width(), crop.height()), (100, 100));

    let elements = build_elements(&layout, &figures);
    let text = write_text(&elements, &work.join("output.txt")).await.unwrap();
    assert_eq!(
        text,
        "Question 1: State Newton's first law.\n\n\
         [FIGURE: figures/figure_1_0.png]\n\n\
         Question 2: Explain the graph.\n\n\
         Question 3: Define momentum.\n\n"
    );

    // The text file feeds the LaTeX stage unchanged.
    let read_back = read_text_file(&work.join("output.txt")).await.unwrap();
    assert_eq!(read_back, text);
}

#[tokio::test]
async fn llm_reply_becomes_complete_document() {
    let dir = TempDir::new().unwrap();
    let reply = "```latex\n\\documentclass{article}\n\\usepackage{amsmath}\n\\begin{document}\n\
                 \\section*{Question 1}\nState Newton's first law.   \n\n\n\n\\end{document}\n```";

    let body = clean_latex(reply);
    assert_eq!(body, "\\section*{Question 1}\nState Newton's first law.");

    let doc = assemble_document(&body);
    let tex = dir.path().join("paper_itl_final.tex");
    write_tex(&doc, &tex).await.unwrap();

    let written = std::fs::read_to_string(&tex).unwrap();
    assert!(written.starts_with("\\documentclass"));
    assert_eq!(written.matches("\\begin{document}").count(), 1);
    assert!(written.trim_end().ends_with("\\end{document}"));
    assert!(written.contains("State Newton's first law."));
}

#[tokio::test]
async fn empty_text_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("output.txt");
    std::fs::write(&path, "  \n\n").unwrap();
    assert!(matches!(
        read_text_file(&path).await,
        Err(Pdf2LatexError::EmptyText { .. })
    ));
    assert!(matches!(
        read_text_file(&dir.path().join("missing.txt")).await,
        Err(Pdf2LatexError::TextFileNotFound { .. })
    ));
}
