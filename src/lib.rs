//! Document Chat
//!
//! Ask questions about an uploaded document and a set of web pages:
//! - Extracts text from .txt/.pdf uploads and from fetched HTML pages
//! - Sends the combined content and the question to OpenAI, Claude or Gemini
//! - Keeps conversation memory per session (message buffer, rolling summary
//!   or word-budget buffer)
//! - Serves sessions over a REST API and from a terminal chat
//!
//! FLOW:
//! CONTENT → PROMPT + MEMORY CONTEXT → MODEL → ANSWER → MEMORY UPDATE

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod memory;
pub mod models;
pub mod session;
pub mod state;

pub use error::{ChatError, Result};

// Re-export common types
pub use models::*;
pub use session::Session;
