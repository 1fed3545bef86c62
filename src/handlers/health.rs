use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

use crate::db;
use crate::error::AppResult;
use crate::services::ocr_service::{is_pdftoppm_available, is_tesseract_available};
use crate::state::AppState;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Pins the uptime clock to process start rather than the first probe.
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

/// Health check endpoint
pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let database = db::ping(&state.db).await;

    let pdftoppm_path = state.config.pdftoppm_path.clone();
    let tesseract_path = state.config.tesseract_path.clone();
    let (pdftoppm, tesseract) = tokio::task::spawn_blocking(move || {
        (
            is_pdftoppm_available(&pdftoppm_path),
            is_tesseract_available(&tesseract_path),
        )
    })
    .await?;

    let (total_requests, rejected_requests, available_permits) = state.limiter.metrics();

    let status = if database && pdftoppm && tesseract {
        "healthy"
    } else {
        "degraded"
    };

    let response = json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": STARTED_AT.elapsed().as_secs(),
        "services": {
            "database": database,
            "pdftoppm": pdftoppm,
            "tesseract": tesseract,
            "inference_model": state.inference.model(),
        },
        "rate_limiting": {
            "total_requests": total_requests,
            "rejected_requests": rejected_requests,
            "available_permits": available_permits,
        }
    });

    info!(
        status = status,
        database = database,
        ocr_available = pdftoppm && tesseract,
        "Health check completed"
    );

    Ok(Json(response))
}

/// Readiness check endpoint
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if db::ping(&state.db).await {
        Ok(StatusCode::OK)
    } else {
        info!("Readiness check failed - database unavailable");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
