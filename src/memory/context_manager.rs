//! Conversation memory manager
//!
//! Holds exactly one strategy's state per session and decides what prior
//! context is replayed before each new question.

use crate::llm::Generate;
use crate::memory::store::{MessageWindow, WordBudgetBuffer};
use crate::memory::summarizer::RollingSummary;
use crate::models::{MemoryStrategy, Message};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Strategy-specific representation of prior turns. Variants never mix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    MessageBuffer(MessageWindow),
    Summary(RollingSummary),
    TokenBuffer(WordBudgetBuffer),
}

impl ConversationState {
    /// Fresh, empty state for a strategy
    pub fn empty(strategy: MemoryStrategy) -> Self {
        match strategy {
            MemoryStrategy::MessageBuffer => ConversationState::MessageBuffer(MessageWindow::new()),
            MemoryStrategy::Summary => ConversationState::Summary(RollingSummary::new()),
            MemoryStrategy::TokenBuffer => ConversationState::TokenBuffer(WordBudgetBuffer::new()),
        }
    }

    pub fn strategy(&self) -> MemoryStrategy {
        match self {
            ConversationState::MessageBuffer(_) => MemoryStrategy::MessageBuffer,
            ConversationState::Summary(_) => MemoryStrategy::Summary,
            ConversationState::TokenBuffer(_) => MemoryStrategy::TokenBuffer,
        }
    }
}

/// Owns the running context for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMemory {
    state: ConversationState,
}

impl ConversationMemory {
    pub fn new(strategy: MemoryStrategy) -> Self {
        Self {
            state: ConversationState::empty(strategy),
        }
    }

    pub fn strategy(&self) -> MemoryStrategy {
        self.state.strategy()
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Change strategy. Prior state is discarded so semantics never mix.
    /// Returns false when the strategy was already active.
    pub fn switch_strategy(&mut self, strategy: MemoryStrategy) -> bool {
        if self.strategy() == strategy {
            return false;
        }

        info!(from = %self.strategy(), to = %strategy, "Switching memory strategy, state cleared");
        self.state = ConversationState::empty(strategy);
        true
    }

    /// Record one answered exchange under the active strategy.
    ///
    /// The summary strategy calls back into `generator`; if that call fails
    /// the previous summary stays in place and the error is returned.
    pub async fn record(
        &mut self,
        question: &str,
        answer: &str,
        generator: &dyn Generate,
    ) -> crate::Result<()> {
        match &mut self.state {
            ConversationState::MessageBuffer(window) => {
                window.record(question, answer);
                debug!(messages = window.len(), "Recorded exchange in message buffer");
            }
            ConversationState::Summary(summary) => {
                summary.regenerate(question, answer, generator).await?;
            }
            ConversationState::TokenBuffer(buffer) => {
                let evicted = buffer.record(question, answer);
                debug!(
                    messages = buffer.len(),
                    words = buffer.total_words(),
                    evicted,
                    "Recorded exchange in word-budget buffer"
                );
            }
        }
        Ok(())
    }

    /// Messages to prepend before the next user prompt
    pub fn context_for_next_call(&self) -> Vec<Message> {
        match &self.state {
            ConversationState::MessageBuffer(window) => window.messages().cloned().collect(),
            ConversationState::Summary(summary) => vec![summary.context()],
            ConversationState::TokenBuffer(buffer) => buffer.messages().cloned().collect(),
        }
    }

    /// Display view of the current state
    pub fn snapshot(&self) -> MemorySnapshot {
        match &self.state {
            ConversationState::MessageBuffer(window) => MemorySnapshot::Messages {
                strategy: MemoryStrategy::MessageBuffer,
                messages: window.messages().cloned().collect(),
                word_count: None,
            },
            ConversationState::Summary(summary) => MemorySnapshot::Summary {
                summary: summary.text().to_string(),
            },
            ConversationState::TokenBuffer(buffer) => MemorySnapshot::Messages {
                strategy: MemoryStrategy::TokenBuffer,
                messages: buffer.messages().cloned().collect(),
                word_count: Some(buffer.total_words()),
            },
        }
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(MemoryStrategy::default())
    }
}

/// What the user sees under "Conversation Memory"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemorySnapshot {
    Messages {
        strategy: MemoryStrategy,
        messages: Vec<Message>,
        #[serde(skip_serializing_if = "Option::is_none")]
        word_count: Option<usize>,
    },
    Summary {
        summary: String,
    },
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemorySnapshot::Summary { summary } => write!(f, "Summary: {}", summary),
            MemorySnapshot::Messages { messages, .. } => {
                for (i, msg) in messages.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}: {}", msg.role().label(), msg.content())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::models::Role;
    use async_trait::async_trait;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl Generate for FixedGenerator {
        async fn generate(&self, _prompt: &str, _context: &[Message]) -> crate::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generate for FailingGenerator {
        async fn generate(&self, _prompt: &str, _context: &[Message]) -> crate::Result<String> {
            Err(ChatError::LlmError("backend down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_message_buffer_context() {
        let mut memory = ConversationMemory::new(MemoryStrategy::MessageBuffer);
        let generator = FixedGenerator("unused");

        for i in 1..=3 {
            memory
                .record(&format!("Q{}", i), &format!("A{}", i), &generator)
                .await
                .unwrap();
        }

        let context = memory.context_for_next_call();
        assert_eq!(context.len(), 5);
        assert_eq!(context.first().unwrap(), &Message::assistant("A1"));
        assert_eq!(context.last().unwrap(), &Message::assistant("A3"));
    }

    #[tokio::test]
    async fn test_summary_context_is_single_system_message() {
        let mut memory = ConversationMemory::new(MemoryStrategy::Summary);
        assert_eq!(
            memory.context_for_next_call(),
            vec![Message::system("Previous conversation summary: ")]
        );

        memory
            .record("Who signed the contract?", "The landlord.", &FixedGenerator("Talked about the contract."))
            .await
            .unwrap();

        let context = memory.context_for_next_call();
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].role(), Role::System);
        assert_eq!(context[0].content(), "Previous conversation summary: Talked about the contract.");
    }

    #[tokio::test]
    async fn test_failed_summary_leaves_state_identical() {
        let mut memory = ConversationMemory::new(MemoryStrategy::Summary);
        memory
            .record("Q1", "A1", &FixedGenerator("First summary."))
            .await
            .unwrap();
        let before = memory.clone();

        let result = memory.record("Q2", "A2", &FailingGenerator).await;
        assert!(result.is_err());
        assert_eq!(memory, before);
    }

    #[tokio::test]
    async fn test_switching_strategy_clears_state() {
        let mut memory = ConversationMemory::new(MemoryStrategy::MessageBuffer);
        memory.record("Q1", "A1", &FixedGenerator("")).await.unwrap();
        assert_eq!(memory.context_for_next_call().len(), 2);

        assert!(memory.switch_strategy(MemoryStrategy::TokenBuffer));
        assert!(memory.context_for_next_call().is_empty());

        memory.record("Q2", "A2", &FixedGenerator("")).await.unwrap();
        assert!(memory.switch_strategy(MemoryStrategy::Summary));
        assert_eq!(
            memory.context_for_next_call(),
            vec![Message::system("Previous conversation summary: ")]
        );

        assert!(memory.switch_strategy(MemoryStrategy::MessageBuffer));
        assert!(memory.context_for_next_call().is_empty());
    }

    #[tokio::test]
    async fn test_same_strategy_keeps_state() {
        let mut memory = ConversationMemory::new(MemoryStrategy::TokenBuffer);
        memory.record("Q1", "A1", &FixedGenerator("")).await.unwrap();

        assert!(!memory.switch_strategy(MemoryStrategy::TokenBuffer));
        assert_eq!(memory.context_for_next_call().len(), 2);
    }

    #[tokio::test]
    async fn test_token_buffer_snapshot_reports_words() {
        let mut memory = ConversationMemory::new(MemoryStrategy::TokenBuffer);
        memory
            .record("how are you", "fine thanks", &FailingGenerator)
            .await
            .unwrap();

        match memory.snapshot() {
            MemorySnapshot::Messages { word_count, messages, .. } => {
                assert_eq!(word_count, Some(5));
                assert_eq!(messages.len(), 2);
            }
            other => panic!("unexpected snapshot {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_rendering() {
        let snapshot = MemorySnapshot::Messages {
            strategy: MemoryStrategy::MessageBuffer,
            messages: vec![Message::user("Q1"), Message::assistant("A1")],
            word_count: None,
        };
        assert_eq!(snapshot.to_string(), "User: Q1\nAssistant: A1");

        let summary = MemorySnapshot::Summary {
            summary: "Short recap".to_string(),
        };
        assert_eq!(summary.to_string(), "Summary: Short recap");
    }

    #[test]
    fn test_snapshot_serialization() {
        let memory = ConversationMemory::new(MemoryStrategy::Summary);
        let json = serde_json::to_value(memory.snapshot()).unwrap();
        assert_eq!(json["kind"], "summary");
        assert_eq!(json["summary"], "");
    }
}
