use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::middleware::rate_limit::RequestLimiter;
use crate::services::inference::InferenceBackend;
use crate::services::pdf_processor::PdfProcessor;

/// Shared application state injected into all route handlers via axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub inference: Arc<dyn InferenceBackend>,
    pub processor: Arc<PdfProcessor>,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config, inference: Arc<dyn InferenceBackend>) -> Self {
        let processor = Arc::new(PdfProcessor::new(&config));
        let limiter = Arc::new(RequestLimiter::new(config.max_concurrent_requests));
        Self {
            db,
            config: Arc::new(config),
            inference,
            processor,
            limiter,
        }
    }
}
