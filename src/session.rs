//! Chat session
//!
//! Per-session context object: configuration, extracted content and
//! conversation memory. Every operation goes through `&mut Session`, so one
//! question is fully processed before the next one starts.

use crate::error::ChatError;
use crate::extract::{self, DocumentKind, UrlText};
use crate::llm::Generate;
use crate::memory::{ConversationMemory, MemorySnapshot};
use crate::models::SessionConfig;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// An uploaded document after extraction
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub fingerprint: String,
    pub text: String,
}

/// Result of one answered question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskOutcome {
    pub answer: String,
    /// Set when the answer was produced but memory could not be updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_warning: Option<String>,
}

/// Per-URL failure reported back to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

pub struct Session {
    id: Uuid,
    config: SessionConfig,
    document: Option<UploadedDocument>,
    urls: Vec<UrlText>,
    memory: ConversationMemory,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(config: SessionConfig) -> crate::Result<Self> {
        Self::with_id(Uuid::new_v4(), config)
    }

    pub fn with_id(id: Uuid, config: SessionConfig) -> crate::Result<Self> {
        config.validate()?;

        Ok(Self {
            id,
            memory: ConversationMemory::new(config.memory),
            config,
            document: None,
            urls: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(|u| u.url.as_str())
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a new vendor/model/memory selection. Memory is reset only when
    /// the strategy changes.
    pub fn configure(&mut self, config: SessionConfig) -> crate::Result<()> {
        config.validate()?;

        if self.memory.switch_strategy(config.memory) {
            info!(session_id = %self.id, strategy = %config.memory, "Memory strategy changed");
        }
        self.config = config;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Extract and keep an uploaded document. Re-uploading identical bytes
    /// is a no-op. On failure the previous document is left in place.
    pub fn upload_document(&mut self, file_name: &str, bytes: &[u8]) -> crate::Result<()> {
        let kind = DocumentKind::from_file_name(file_name)?;
        let fingerprint = extract::fingerprint(bytes);

        if let Some(existing) = &self.document {
            if existing.fingerprint == fingerprint {
                info!(session_id = %self.id, file_name, "Document already processed");
                return Ok(());
            }
        }

        let text = extract::extract_document(kind, bytes)?;
        info!(
            session_id = %self.id,
            file_name,
            chars = text.len(),
            "Document processed"
        );

        self.document = Some(UploadedDocument {
            file_name: file_name.to_string(),
            fingerprint,
            text,
        });
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn clear_document(&mut self) {
        if self.document.take().is_some() {
            info!(session_id = %self.id, "Document removed");
            self.updated_at = Utc::now();
        }
    }

    /// Replace the URL list, fetching each page now. Returns the URLs that
    /// failed; their text is empty.
    pub async fn set_urls(&mut self, client: &Client, urls: Vec<String>) -> Vec<UrlFailure> {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        self.urls = extract::fetch_all(client, &urls).await;
        self.updated_at = Utc::now();

        self.urls
            .iter()
            .filter_map(|u| {
                u.error.as_ref().map(|error| UrlFailure {
                    url: u.url.clone(),
                    error: error.clone(),
                })
            })
            .collect()
    }

    /// Document text followed by URL text
    pub fn combined_content(&self) -> String {
        extract::combine_content(self.document.as_ref().map(|d| d.text.as_str()), &self.urls)
    }

    /// True when there is non-blank document or URL text to ask about
    pub fn has_content(&self) -> bool {
        !self.combined_content().trim().is_empty()
    }

    /// Answer a question about the current content.
    ///
    /// If generation fails the error is returned and memory is untouched.
    pub async fn ask(
        &mut self,
        question: &str,
        generator: &dyn Generate,
    ) -> crate::Result<AskOutcome> {
        if question.trim().is_empty() {
            return Err(ChatError::InvalidRequest("question is empty".to_string()));
        }

        if !self.has_content() {
            return Err(ChatError::NoContent);
        }
        let content = self.combined_content();

        let prompt = build_prompt(&content, question);
        let context = self.memory.context_for_next_call();

        info!(
            session_id = %self.id,
            vendor = %self.config.vendor,
            model = %self.config.model,
            memory = %self.memory.strategy(),
            "Answering question"
        );

        let answer = generator.generate(&prompt, &context).await?;

        let memory_warning = match self.memory.record(question, &answer, generator).await {
            Ok(()) => None,
            Err(e) => {
                warn!(session_id = %self.id, "Conversation memory not updated: {}", e);
                Some(format!("Conversation memory not updated: {}", e))
            }
        };
        self.updated_at = Utc::now();

        Ok(AskOutcome {
            answer,
            memory_warning,
        })
    }

    pub fn memory_snapshot(&self) -> MemorySnapshot {
        self.memory.snapshot()
    }
}

/// Embed the extracted content and the question in one prompt
pub fn build_prompt(content: &str, question: &str) -> String {
    format!("Here's the content: {} \n\n---\n\n {}", content, question)
}
