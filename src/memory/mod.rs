//! Conversation Memory System
//!
//! Three interchangeable strategies decide what prior context is replayed to
//! the model: a five-message buffer, a rolling summary and a word-budget
//! buffer.

pub mod context_manager;
pub mod store;
pub mod summarizer;

pub use context_manager::{ConversationMemory, ConversationState, MemorySnapshot};
pub use store::{MessageWindow, WordBudgetBuffer, MESSAGE_WINDOW_CAPACITY, WORD_BUDGET_CEILING};
pub use summarizer::RollingSummary;
