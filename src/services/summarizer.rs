use tracing::info;

use crate::error::{AppError, AppResult};
use crate::services::inference::InferenceBackend;
use crate::services::pdf_processor::ExtractionResult;

const SUMMARY_INSTRUCTION: &str = "Summarize the following text in bullet points:";

pub fn build_summary_prompt(text: &str) -> String {
    format!("{}\n{}", SUMMARY_INSTRUCTION, text)
}

/// Sends the extracted text for summarization in a single request.
///
/// A document without any text is rejected before the endpoint is contacted.
pub async fn summarize(
    backend: &dyn InferenceBackend,
    extraction: &ExtractionResult,
) -> AppResult<String> {
    if extraction.is_empty() {
        return Err(AppError::EmptyDocument);
    }

    let prompt = build_summary_prompt(&extraction.text());
    info!(
        model = backend.model(),
        prompt_chars = prompt.chars().count(),
        "Requesting summary"
    );

    let summary = backend.generate(&prompt).await?;
    Ok(summary.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::inference::InferenceError;
    use crate::services::pdf_processor::{PageText, TextSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubBackend {
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
        fail: bool,
    }

    impl StubBackend {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
                fail,
            }
        }
    }

    #[async_trait]
    impl InferenceBackend for StubBackend {
        async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            if self.fail {
                Err(InferenceError::Status {
                    status: 500,
                    body: "model not loaded".to_string(),
                })
            } else {
                Ok("  - point one\n- point two \n".to_string())
            }
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    fn extraction(texts: &[&str]) -> ExtractionResult {
        ExtractionResult {
            pages: texts
                .iter()
                .enumerate()
                .map(|(index, text)| PageText {
                    index,
                    text: text.to_string(),
                    source: TextSource::Embedded,
                })
                .collect(),
            ..ExtractionResult::default()
        }
    }

    #[tokio::test]
    async fn empty_document_never_reaches_the_endpoint() {
        let backend = StubBackend::new(false);
        let result = summarize(&backend, &extraction(&["", "   "])).await;
        assert!(matches!(result, Err(AppError::EmptyDocument)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_page_document_is_empty() {
        let backend = StubBackend::new(false);
        let result = summarize(&backend, &extraction(&[])).await;
        assert!(matches!(result, Err(AppError::EmptyDocument)));
    }

    #[tokio::test]
    async fn prompt_wraps_all_pages_in_order() {
        let backend = StubBackend::new(false);
        let summary = summarize(&backend, &extraction(&["alpha", "beta"])).await.unwrap();

        assert_eq!(summary, "- point one\n- point two");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let prompt = backend.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Summarize the following text in bullet points:\n"));
        assert!(prompt.find("alpha").unwrap() < prompt.find("beta").unwrap());
    }

    #[tokio::test]
    async fn endpoint_failure_is_not_retried() {
        let backend = StubBackend::new(true);
        let result = summarize(&backend, &extraction(&["some text"])).await;
        assert!(matches!(result, Err(AppError::Inference { .. })));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
