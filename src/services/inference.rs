//! Client for the language-model inference endpoint.
//!
//! The endpoint speaks the Ollama `/api/generate` protocol: one POST with a
//! model name and a prompt, one JSON object back with the generated text in
//! `response`. Calls are made at most once; there is no retry or streaming.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("endpoint returned an empty response")]
    Empty,
}

impl From<InferenceError> for AppError {
    fn from(err: InferenceError) -> Self {
        AppError::Inference {
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        Self::new(
            &config.inference_url,
            config.inference_model.clone(),
            Duration::from_secs(config.inference_timeout_seconds),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending inference request"
        );

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = response.json().await?;
        if body.response.trim().is_empty() {
            return Err(InferenceError::Empty);
        }

        debug!(response_chars = body.response.chars().count(), "Inference request succeeded");
        Ok(body.response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_joined_without_double_slash() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn request_body_disables_streaming() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
        })
        .unwrap();
        assert_eq!(body["stream"], serde_json::json!(false));
        assert_eq!(body["model"], "llama3");
    }

    #[test]
    fn inference_errors_map_to_bad_gateway() {
        let err: AppError = InferenceError::Empty.into();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), "INFERENCE_ERROR");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        let client = OllamaClient::new("http://127.0.0.1:1", "llama3", Duration::from_secs(2)).unwrap();
        assert!(matches!(client.generate("hello").await, Err(InferenceError::Http(_))));
    }
}
