//! OpenAI chat completions backend
//!
//! Chat-message-array shape: context messages are sent as-is with the new
//! prompt appended as the final user message.

use super::Backend;
use crate::error::ChatError;
use crate::models::{Message, Vendor};
use crate::Result;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

pub struct OpenAiBackend {
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Backend for OpenAiBackend {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAi
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_key)
    }

    fn build_request(&self, context: &[Message], prompt: &str) -> Result<Value> {
        let mut messages = Vec::with_capacity(context.len() + 1);
        messages.extend(context.iter().cloned());
        messages.push(Message::user(prompt));

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(&self, raw: &str) -> Result<String> {
        let response: ChatCompletionResponse = serde_json::from_str(raw).map_err(|e| {
            error!("Failed to parse OpenAI response: {}", e);
            ChatError::LlmError(format!("OpenAI parse error: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ChatError::EmptyResponse(Vendor::OpenAi))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            "https://api.openai.com/".to_string(),
        )
    }

    #[test]
    fn test_payload_appends_prompt_to_context() {
        let context = vec![
            Message::system("Previous conversation summary: greetings"),
            Message::user("Q1"),
        ];
        let payload = backend().build_request(&context, "Q2").unwrap();

        assert_eq!(payload["model"], "gpt-4o-mini");
        let messages = payload["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "Q2");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            backend().endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_null_content_is_empty_response() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let err = backend().parse_response(raw).unwrap_err();
        assert!(matches!(err, ChatError::EmptyResponse(Vendor::OpenAi)));
    }

    #[test]
    fn test_malformed_body_is_llm_error() {
        let err = backend().parse_response("<html>").unwrap_err();
        assert!(matches!(err, ChatError::LlmError(_)));
    }
}
