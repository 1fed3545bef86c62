use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde::Serialize;
use tracing::info;

use crate::db::{resumes, users::CurrentUser};
use crate::db::resumes::Resume;
use crate::error::{AppError, AppResult};
use crate::models::ResumeForm;
use crate::services::{resume_builder, resume_pdf};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub success: bool,
    pub resume: Resume,
}

/// POST /resume
pub async fn generate_resume(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(form): Json<ResumeForm>,
) -> AppResult<Json<ResumeResponse>> {
    form.validate().map_err(AppError::validation)?;

    let html = resume_builder::generate_resume_html(state.inference.as_ref(), &form).await?;
    let resume = resumes::upsert(&state.db, &user.id, &form, &html).await?;

    info!(
        user_id = %user.id,
        resume_id = %resume.id,
        html_chars = html.chars().count(),
        "Resume generated and stored"
    );

    Ok(Json(ResumeResponse {
        success: true,
        resume,
    }))
}

/// GET /resume
pub async fn get_resume(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<ResumeResponse>> {
    let resume = resumes::find_for_user(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("resume"))?;
    Ok(Json(ResumeResponse {
        success: true,
        resume,
    }))
}

const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"resume.pdf\"";

/// GET /resume/pdf
pub async fn download_resume_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Response> {
    let resume = resumes::find_for_user(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::not_found("resume"))?;
    let html = resume
        .generated_content
        .ok_or_else(|| AppError::not_found("generated resume content"))?;

    let pdf = tokio::task::spawn_blocking(move || resume_pdf::render_resume_pdf(&html)).await??;
    info!(user_id = %user.id, bytes = pdf.len(), "Resume exported to PDF");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, DOWNLOAD_DISPOSITION),
        ],
        pdf,
    )
        .into_response())
}
