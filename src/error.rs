//! Error types for the document chat service

use crate::models::Vendor;
use thiserror::Error;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

#[derive(Error, Debug)]
pub enum ChatError {

    // =============================
    // Content Extraction Errors
    // =============================

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Document extraction error: {0}")]
    ExtractionError(String),

    #[error("Failed to fetch {url}: {reason}")]
    UrlFetchError { url: String, reason: String },

    // =============================
    // Session Errors
    // =============================

    #[error("No document or URL content to ask about")]
    NoContent,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model {model} is not offered by {vendor}")]
    InvalidModel { vendor: Vendor, model: String },

    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    // =============================
    // Model Backend Errors
    // =============================

    #[error("{0} API key not configured")]
    MissingApiKey(Vendor),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Empty response from {0}")]
    EmptyResponse(Vendor),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChatError {
    /// True when the failure came from the model vendor rather than user input
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            ChatError::LlmError(_) | ChatError::EmptyResponse(_) | ChatError::HttpError(_)
        )
    }
}
