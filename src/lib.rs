//! FormEase service
//!
//! PDF summarization with an OCR fallback, an LLM-backed resume builder with
//! PDF export, and a chatbot, served over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
