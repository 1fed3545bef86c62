use tracing::warn;

use crate::services::inference::InferenceBackend;

pub const CHAT_FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble processing your request at the moment.";

pub fn build_chat_prompt(message: &str) -> String {
    format!("You are FormEase assistant. Response to: {}", message)
}

/// The chatbot always answers; endpoint failures turn into an apology.
pub async fn chatbot_reply(backend: &dyn InferenceBackend, message: &str) -> String {
    match backend.generate(&build_chat_prompt(message)).await {
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "Chat inference failed, sending fallback reply");
            CHAT_FALLBACK_REPLY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::inference::InferenceError;
    use async_trait::async_trait;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl InferenceBackend for Fixed {
        async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
            assert!(prompt.starts_with("You are FormEase assistant. Response to: "));
            self.0.map(str::to_string).ok_or(InferenceError::Empty)
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn returns_model_reply() {
        assert_eq!(chatbot_reply(&Fixed(Some(" Hi there! ")), "hello").await, "Hi there!");
    }

    #[tokio::test]
    async fn apologizes_on_failure() {
        assert_eq!(chatbot_reply(&Fixed(None), "hello").await, CHAT_FALLBACK_REPLY);
    }
}
