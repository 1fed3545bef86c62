pub mod auth;
pub mod chat;
pub mod health;
pub mod resume;
pub mod summary;

pub use auth::*;
pub use chat::*;
pub use health::*;
pub use resume::*;
pub use summary::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};

use crate::middleware::{auth::require_session, rate_limit::rate_limit_middleware};
use crate::state::AppState;

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Builds every route. Cross-cutting layers (tracing, CORS, request ids) are
/// added by the binary.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    let protected = Router::new()
        .route("/pdf-summary", post(summary_handler))
        .route("/resume", get(get_resume).post(generate_resume))
        .route("/resume/pdf", get(download_resume_pdf))
        .route("/chat/message", any(chat_message))
        .route("/chat/history", get(chat_history))
        .route("/auth/logout", post(logout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
