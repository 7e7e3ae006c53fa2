//! Core data models for the document chat service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChatError;

//
// ================= Messages =================
//

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Capitalized label used when rendering memory for display
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whitespace-delimited word count, used as a token estimate
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }
}

/// Count whitespace-separated words. This is the token proxy for the
/// word-budget memory and must stay a plain whitespace split.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

//
// ================= Vendors =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    OpenAi,
    Anthropic,
    Gemini,
}

impl Vendor {
    /// Models selectable for this vendor, default first
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Vendor::OpenAi => &["gpt-3.5-turbo", "gpt-4o-mini"],
            Vendor::Anthropic => &["claude-2", "claude-instant-1"],
            Vendor::Gemini => &["gemini-pro"],
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0]
    }

    pub fn offers(&self, model: &str) -> bool {
        self.models().contains(&model)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Vendor::OpenAi => "OpenAI",
            Vendor::Anthropic => "Claude",
            Vendor::Gemini => "Gemini",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Vendor {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Vendor::OpenAi),
            "anthropic" | "claude" => Ok(Vendor::Anthropic),
            "gemini" | "google" => Ok(Vendor::Gemini),
            other => Err(ChatError::InvalidRequest(format!(
                "unknown vendor '{}'",
                other
            ))),
        }
    }
}

//
// ================= Memory Strategy =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStrategy {
    /// Last five messages, oldest evicted first
    #[default]
    MessageBuffer,
    /// One running summary regenerated after every exchange
    Summary,
    /// Messages bounded by a whitespace word budget
    TokenBuffer,
}

impl fmt::Display for MemoryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoryStrategy::MessageBuffer => "Buffer of 5 questions",
            MemoryStrategy::Summary => "Conversation summary",
            MemoryStrategy::TokenBuffer => "Buffer of 5,000 tokens",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MemoryStrategy {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "message_buffer" | "buffer" => Ok(MemoryStrategy::MessageBuffer),
            "summary" | "conversation_summary" => Ok(MemoryStrategy::Summary),
            "token_buffer" | "tokens" => Ok(MemoryStrategy::TokenBuffer),
            other => Err(ChatError::InvalidRequest(format!(
                "unknown memory strategy '{}'",
                other
            ))),
        }
    }
}

//
// ================= Session Config =================
//

/// Vendor, model and memory selection for one session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    pub vendor: Vendor,
    pub model: String,
    pub memory: MemoryStrategy,
}

impl SessionConfig {
    /// Build a config, falling back to the vendor's default model
    pub fn new(vendor: Vendor, model: Option<String>, memory: MemoryStrategy) -> Self {
        Self {
            vendor,
            model: model.unwrap_or_else(|| vendor.default_model().to_string()),
            memory,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !self.vendor.offers(&self.model) {
            return Err(ChatError::InvalidModel {
                vendor: self.vendor,
                model: self.model.clone(),
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Vendor::OpenAi, None, MemoryStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n"), 0);
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::assistant("The report is due Friday");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "The report is due Friday");
    }

    #[test]
    fn test_vendor_model_catalogue() {
        assert!(Vendor::OpenAi.offers("gpt-4o-mini"));
        assert!(!Vendor::OpenAi.offers("claude-2"));
        assert_eq!(Vendor::Gemini.default_model(), "gemini-pro");
        assert_eq!("Claude".parse::<Vendor>().unwrap(), Vendor::Anthropic);
    }

    #[test]
    fn test_config_validation() {
        let ok = SessionConfig::new(Vendor::Anthropic, None, MemoryStrategy::Summary);
        assert_eq!(ok.model, "claude-2");
        assert!(ok.validate().is_ok());

        let bad = SessionConfig::new(
            Vendor::Gemini,
            Some("gpt-3.5-turbo".to_string()),
            MemoryStrategy::MessageBuffer,
        );
        assert!(matches!(bad.validate(), Err(ChatError::InvalidModel { .. })));
    }

    #[test]
    fn test_memory_strategy_parsing() {
        assert_eq!(
            "token-buffer".parse::<MemoryStrategy>().unwrap(),
            MemoryStrategy::TokenBuffer
        );
        assert!("forever".parse::<MemoryStrategy>().is_err());
    }
}
