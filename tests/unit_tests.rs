//! Unit tests for individual components

use std::env;

use axum::http::StatusCode;
use bytes::Bytes;
use formease::{
    config::Config,
    error::AppError,
    models::{ResumeForm, SkillEntry, UploadedDocument},
    services::{
        chatbot::build_chat_prompt,
        ocr_service::PdftoppmRasterizer,
        pdf_processor::{ExtractionPolicy, ExtractionResult, PageText, TextSource},
        resume_builder::{build_resume_prompt, clean_generated_html, escape_html},
        resume_pdf::{html_to_lines, render_resume_pdf, wrap, LineStyle},
        summarizer::build_summary_prompt,
        PdfProcessor,
    },
};

#[test]
fn test_config_from_env() {
    env::set_var("MAX_FILE_SIZE_MB", "5");
    env::set_var("OCR_MIN_CHARS", "80");
    env::set_var("OCR_ZOOM", "3.0");
    env::set_var("INFERENCE_MODEL", "mistral");
    env::set_var("SESSION_TTL_HOURS", "not-a-number");

    let config = Config::from_env().unwrap();
    assert_eq!(config.max_file_size_mb, 5);
    assert_eq!(config.max_file_size_bytes(), 5 * 1024 * 1024);
    assert_eq!(config.ocr_min_chars, 80);
    assert_eq!(config.ocr_zoom, 3.0);
    assert_eq!(config.inference_model, "mistral");
    // Unparseable values fall back to the default.
    assert_eq!(config.session_ttl_hours, 336);

    env::remove_var("MAX_FILE_SIZE_MB");
    env::remove_var("OCR_MIN_CHARS");
    env::remove_var("OCR_ZOOM");
    env::remove_var("INFERENCE_MODEL");
    env::remove_var("SESSION_TTL_HOURS");
}

#[test]
fn test_error_codes() {
    assert_eq!(AppError::Unauthorized.error_code(), "UNAUTHORIZED");
    assert_eq!(AppError::RateLimitExceeded.error_code(), "RATE_LIMIT_EXCEEDED");
    assert_eq!(AppError::FileTooLarge { limit: 10 }.error_code(), "FILE_TOO_LARGE");
    assert_eq!(AppError::EmptyDocument.error_code(), "EMPTY_DOCUMENT");
    assert_eq!(AppError::validation("test").error_code(), "VALIDATION_ERROR");
    assert_eq!(AppError::not_found("resume").error_code(), "NOT_FOUND");
}

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::RateLimitExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        AppError::FileTooLarge { limit: 10 }.status_code(),
        StatusCode::PAYLOAD_TOO_LARGE
    );
    assert_eq!(AppError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::EmptyDocument.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(AppError::conflict("taken").status_code(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::Inference { message: "timeout".to_string() }.status_code(),
        StatusCode::BAD_GATEWAY
    );
}

#[test]
fn test_public_messages_hide_internals() {
    let db = AppError::DatabaseError {
        message: "no such table: users".to_string(),
    };
    assert_eq!(db.public_message(), "A database error occurred");

    let inference = AppError::Inference {
        message: "connection refused (os error 111)".to_string(),
    };
    assert!(!inference.public_message().contains("connection refused"));
    // The same message serves summaries, resumes and anything else backed by the model.
    assert!(!inference.public_message().contains("summary"));
}

#[test]
fn test_error_conversions() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let app_error: AppError = io_error.into();
    assert_eq!(app_error.error_code(), "INTERNAL_ERROR");

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let app_error: AppError = json_error.into();
    assert_eq!(app_error.error_code(), "VALIDATION_ERROR");

    let anyhow_error = anyhow::anyhow!("boom");
    let app_error: AppError = anyhow_error.into();
    assert_eq!(app_error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_uploaded_document() {
    let doc = UploadedDocument::new("Form.Pdf".to_string(), Bytes::from_static(b"%PDF-1.7"));
    assert_eq!(doc.size, 8);
    assert!(doc.is_pdf());
    assert!(!UploadedDocument::new("form.pdf.txt".to_string(), Bytes::new()).is_pdf());
}

#[test]
fn test_extraction_result_text() {
    let result = ExtractionResult {
        pages: vec![
            PageText {
                index: 0,
                text: "first page".to_string(),
                source: TextSource::Embedded,
            },
            PageText {
                index: 1,
                text: "second page".to_string(),
                source: TextSource::Ocr,
            },
        ],
        ocr_pages: 1,
        ..ExtractionResult::default()
    };
    assert_eq!(result.page_count(), 2);
    assert_eq!(result.text(), "first page\nsecond page");
    assert!(!result.is_empty());

    let blank = ExtractionResult {
        pages: vec![PageText {
            index: 0,
            text: " \n ".to_string(),
            source: TextSource::EmbeddedAfterOcrFailure,
        }],
        ..ExtractionResult::default()
    };
    assert!(blank.is_empty());
}

#[test]
fn test_extraction_policy_follows_config() {
    let config = Config {
        ocr_min_chars: 120,
        ocr_zoom: 3.0,
        ..Config::default()
    };
    let processor = PdfProcessor::new(&config);
    assert_eq!(processor.policy().min_chars, 120);
    assert_eq!(processor.policy().zoom, 3.0);

    let default = ExtractionPolicy::default();
    assert_eq!(default.min_chars, 50);
    assert_eq!(default.zoom, 2.0);
    assert_eq!(PdftoppmRasterizer::dpi_for_zoom(default.zoom), 144);
}

#[test]
fn test_prompt_builders() {
    assert_eq!(
        build_summary_prompt("line one\nline two"),
        "Summarize the following text in bullet points:\nline one\nline two"
    );
    assert_eq!(
        build_chat_prompt("Where do I sign?"),
        "You are FormEase assistant. Response to: Where do I sign?"
    );
}

#[test]
fn test_resume_prompt_escapes_and_orders_entries() {
    let form = ResumeForm {
        full_name: "<script>alert(1)</script>".to_string(),
        email: "x@example.com".to_string(),
        skills: vec![
            SkillEntry {
                category: "Languages".to_string(),
                skills: "Rust, C".to_string(),
            },
            SkillEntry {
                category: "Tools".to_string(),
                skills: "git".to_string(),
            },
        ],
        ..ResumeForm::default()
    };

    let prompt = build_resume_prompt(&form);
    assert!(prompt.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!prompt.contains("<script>"));
    assert!(prompt.find("- Languages: Rust, C").unwrap() < prompt.find("- Tools: git").unwrap());
    // Empty sections are still present.
    assert!(prompt.contains("Education:\nNone provided"));
    assert_eq!(escape_html("  Tom & Jerry's  "), "Tom &amp; Jerry&#x27;s");
}

#[test]
fn test_generated_html_cleanup() {
    let raw = "```html\n<!DOCTYPE html><html><body>CV</body></html>\n```\nHope this helps!";
    assert_eq!(
        clean_generated_html(raw),
        "<!DOCTYPE html><html><body>CV</body></html>"
    );
    assert_eq!(clean_generated_html("<p>plain</p>"), "<p>plain</p>");
}

#[test]
fn test_resume_pdf_layout() {
    let lines = html_to_lines("<h1>Ada</h1><ul><li>Rust</li><li>Go</li></ul>");
    assert_eq!(lines[0].text, "Ada");
    assert_eq!(lines[0].style, LineStyle::Heading);
    assert!(lines.iter().any(|l| l.text == "- Rust"));

    let wrapped = wrap(&"word ".repeat(60), 40);
    assert!(wrapped.len() > 1);
    assert!(wrapped.iter().all(|l| l.chars().count() <= 40));

    let pdf = render_resume_pdf("<html><body><p>Hello</p></body></html>").unwrap();
    assert!(pdf.starts_with(b"%PDF-1.5"));
}
