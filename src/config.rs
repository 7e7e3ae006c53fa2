//! Runtime configuration
//!
//! Secrets and endpoints come from the environment (a `.env` file is
//! loaded by the binaries through `dotenv`).

use crate::models::{MemoryStrategy, SessionConfig, Vendor};
use std::env;
use tracing::warn;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PORT: u16 = 8080;

/// Application-wide settings shared by every session
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub port: u16,
    /// Config new sessions start with
    pub session_defaults: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let base_url = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        let port = lookup("PORT")
            .or_else(|| lookup("API_PORT"))
            .and_then(|raw| match raw.parse::<u16>() {
                Ok(port) => Some(port),
                Err(e) => {
                    warn!("Ignoring invalid port '{}': {}", raw, e);
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        let vendor = lookup("CHAT_VENDOR")
            .and_then(|raw| match raw.parse::<Vendor>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Ignoring CHAT_VENDOR: {}", e);
                    None
                }
            })
            .unwrap_or(Vendor::OpenAi);

        let memory = lookup("CHAT_MEMORY")
            .and_then(|raw| match raw.parse::<MemoryStrategy>() {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!("Ignoring CHAT_MEMORY: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let mut session_defaults = SessionConfig::new(vendor, lookup("CHAT_MODEL"), memory);
        if let Err(e) = session_defaults.validate() {
            warn!("{}; using {}", e, vendor.default_model());
            session_defaults.model = vendor.default_model().to_string();
        }

        Self {
            openai_api_key: secret("OPENAI_API_KEY"),
            anthropic_api_key: secret("ANTHROPIC_API_KEY"),
            gemini_api_key: secret("GEMINI_API_KEY"),
            openai_base_url: base_url("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            anthropic_base_url: base_url("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
            gemini_base_url: base_url("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            port,
            session_defaults,
        }
    }

    pub fn api_key(&self, vendor: Vendor) -> Option<&str> {
        match vendor {
            Vendor::OpenAi => self.openai_api_key.as_deref(),
            Vendor::Anthropic => self.anthropic_api_key.as_deref(),
            Vendor::Gemini => self.gemini_api_key.as_deref(),
        }
    }

    pub fn base_url(&self, vendor: Vendor) -> &str {
        match vendor {
            Vendor::OpenAi => &self.openai_base_url,
            Vendor::Anthropic => &self.anthropic_base_url,
            Vendor::Gemini => &self.gemini_base_url,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
