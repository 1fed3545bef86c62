use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::db::users::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{SummaryData, SummaryResponse, UploadedDocument};
use crate::services::summarizer;
use crate::state::AppState;

/// Multipart field names accepted for the upload.
const FILE_FIELDS: &[&str] = &["pdf_file", "file"];

/// POST /pdf-summary
pub async fn summary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<SummaryResponse>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();

    info!(request_id = %request_id, user_id = %user.id, "Starting PDF summary request");

    let file = match read_upload(&mut multipart, state.config.max_file_size_mb).await {
        Ok(file) => {
            info!(
                request_id = %request_id,
                file_name = %file.name,
                file_size = file.size,
                "File extracted from multipart form"
            );
            file
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Failed to read upload");
            return Err(e);
        }
    };

    let file_name = file.name.clone();
    let processor = state.processor.clone();
    let extraction = tokio::task::spawn_blocking(move || processor.extract(&file)).await??;

    info!(
        request_id = %request_id,
        pages = extraction.page_count(),
        ocr_pages = extraction.ocr_pages,
        warnings = extraction.warnings.len(),
        "Text extraction finished"
    );

    let summary = summarizer::summarize(state.inference.as_ref(), &extraction).await?;

    let total_time = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        total_time_ms = total_time,
        summary_chars = summary.chars().count(),
        "Summary request completed successfully"
    );

    Ok(Json(SummaryResponse::new(
        SummaryData {
            file_name,
            summary,
            pages: extraction.page_count(),
            ocr_pages: extraction.ocr_pages,
            warnings: extraction.warnings,
        },
        total_time,
    )))
}

/// Body-limit hits surface as multipart errors; those become `FileTooLarge`.
fn upload_error(e: MultipartError, context: &str, max_file_size_mb: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge {
            limit: max_file_size_mb,
        }
    } else {
        AppError::invalid_file(format!("{}: {}", context, e))
    }
}

async fn read_upload(multipart: &mut Multipart, max_file_size_mb: usize) -> AppResult<UploadedDocument> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Failed to read multipart field", max_file_size_mb))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        if !FILE_FIELDS.contains(&field_name.as_str()) {
            debug!(field = %field_name, "Ignoring multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, "Failed to read file data", max_file_size_mb))?;

        let mut file = UploadedDocument::new(file_name, data);
        if let Some(mime_type) = content_type {
            file = file.with_mime_type(mime_type);
        }

        if !file.is_pdf() {
            return Err(AppError::invalid_file("Only .pdf files are accepted"));
        }
        if file.size == 0 {
            return Err(AppError::invalid_file("File is empty"));
        }
        if file.size > max_file_size_mb * 1024 * 1024 {
            return Err(AppError::FileTooLarge {
                limit: max_file_size_mb,
            });
        }

        return Ok(file);
    }

    Err(AppError::MissingFile)
}
