//! Claude text completions backend
//!
//! Single concatenated-prompt shape: the whole conversation is flattened
//! into one transcript that ends with an `Assistant:` cue.

use super::{transcript, Backend};
use crate::error::ChatError;
use crate::models::{Message, Vendor};
use crate::Result;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS_TO_SAMPLE: u32 = 1000;

pub struct AnthropicBackend {
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_prompt(context: &[Message], prompt: &str) -> String {
        let mut text = transcript(context, prompt, "\n\n");
        text.push_str("\n\nAssistant:");
        text
    }
}

impl Backend for AnthropicBackend {
    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/complete", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn build_request(&self, context: &[Message], prompt: &str) -> Result<Value> {
        let request = CompletionRequest {
            model: &self.model,
            prompt: Self::build_prompt(context, prompt),
            max_tokens_to_sample: MAX_TOKENS_TO_SAMPLE,
        };
        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(&self, raw: &str) -> Result<String> {
        let response: CompletionResponse = serde_json::from_str(raw).map_err(|e| {
            error!("Failed to parse Claude response: {}", e);
            ChatError::LlmError(format!("Claude parse error: {}", e))
        })?;

        response
            .completion
            .ok_or(ChatError::EmptyResponse(Vendor::Anthropic))
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens_to_sample: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: Option<String>,
}
