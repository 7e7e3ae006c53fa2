//! Response generation
//!
//! One `Backend` per vendor knows how to shape a request and read a reply.
//! `ResponseGenerator` owns the pooled HTTP client and drives a backend.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use crate::config::AppConfig;
use crate::error::ChatError;
use crate::models::{Message, SessionConfig, Vendor};
use crate::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

/// Anything that can answer a prompt given prior conversation context
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &str, context: &[Message]) -> Result<String>;
}

/// Vendor-specific request/response shaping
pub trait Backend: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Full URL the request is posted to
    fn endpoint(&self) -> String;

    /// Attach credentials and vendor headers
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder;

    /// Serialize `context` plus the new prompt into the vendor payload
    fn build_request(&self, context: &[Message], prompt: &str) -> Result<Value>;

    /// Pull the primary completion text out of a raw response body
    fn parse_response(&self, raw: &str) -> Result<String>;
}

/// Build the long-lived HTTP client shared by all sessions
pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()?;
    Ok(client)
}

/// Render `context` followed by the prompt as `role: content` lines
pub(crate) fn transcript(context: &[Message], prompt: &str, separator: &str) -> String {
    let prompt = Message::user(prompt);
    context
        .iter()
        .chain(std::iter::once(&prompt))
        .map(|msg| format!("{}: {}", msg.role(), msg.content()))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Drives one vendor backend over a pooled client
pub struct ResponseGenerator {
    client: Client,
    backend: Box<dyn Backend>,
}

impl ResponseGenerator {
    pub fn new(client: Client, backend: Box<dyn Backend>) -> Self {
        Self { client, backend }
    }

    /// Select the backend for a session's vendor and model
    pub fn from_config(
        app: &AppConfig,
        session: &SessionConfig,
        client: Client,
    ) -> Result<Self> {
        session.validate()?;

        let vendor = session.vendor;
        let api_key = app
            .api_key(vendor)
            .ok_or(ChatError::MissingApiKey(vendor))?
            .to_string();
        let base_url = app.base_url(vendor).to_string();
        let model = session.model.clone();

        let backend: Box<dyn Backend> = match vendor {
            Vendor::OpenAi => Box::new(OpenAiBackend::new(api_key, model, base_url)),
            Vendor::Anthropic => Box::new(AnthropicBackend::new(api_key, model, base_url)),
            Vendor::Gemini => Box::new(GeminiBackend::new(api_key, model, base_url)),
        };

        Ok(Self::new(client, backend))
    }

    pub fn vendor(&self) -> Vendor {
        self.backend.vendor()
    }
}

#[async_trait]
impl Generate for ResponseGenerator {
    async fn generate(&self, prompt: &str, context: &[Message]) -> Result<String> {
        let vendor = self.backend.vendor();
        let payload = self.backend.build_request(context, prompt)?;

        info!(%vendor, context_messages = context.len(), "Calling model backend");

        let response = self
            .backend
            .authorize(self.client.post(self.backend.endpoint()))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("{} API request failed: {}", vendor, e);
                ChatError::LlmError(format!("{} API error: {}", vendor, e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to read {} response: {}", vendor, e);
            ChatError::LlmError(format!("{} API error: {}", vendor, e))
        })?;

        if !status.is_success() {
            error!("{} API error response ({}): {}", vendor, status, body);
            return Err(ChatError::LlmError(format!(
                "{} API error (HTTP {}): {}",
                vendor, status, body
            )));
        }

        let answer = self.backend.parse_response(&body)?;
        info!(%vendor, answer_chars = answer.len(), "Model response received");

        Ok(answer)
    }
}
