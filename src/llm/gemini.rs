//! Gemini generateContent backend
//!
//! Single concatenated-prompt shape: the conversation is flattened into one
//! text part that ends with an `AI:` cue.

use super::{transcript, Backend};
use crate::error::ChatError;
use crate::models::{Message, Vendor};
use crate::Result;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_prompt(context: &[Message], prompt: &str) -> String {
        let mut text = transcript(context, prompt, "\n");
        text.push_str("\nAI:");
        text
    }
}

impl Backend for GeminiBackend {
    fn vendor(&self) -> Vendor {
        Vendor::Gemini
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("x-goog-api-key", self.api_key.as_str())
    }

    fn build_request(&self, context: &[Message], prompt: &str) -> Result<Value> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(context, prompt),
                }],
            }],
        };
        Ok(serde_json::to_value(request)?)
    }

    fn parse_response(&self, raw: &str) -> Result<String> {
        let response: GeminiResponse = serde_json::from_str(raw).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            ChatError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyResponse(Vendor::Gemini))?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                warn!("Gemini finished with reason {}", reason);
            }
        }

        candidate
            .content
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(ChatError::EmptyResponse(Vendor::Gemini))
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}
