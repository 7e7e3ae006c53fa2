//! Rolling conversation summary
//!
//! After each exchange the model is asked to condense the previous summary
//! together with the latest question and answer.

use crate::llm::Generate;
use crate::models::Message;
use serde::Serialize;
use tracing::{info, warn};

/// Summary text replaced wholesale after every exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollingSummary {
    summary: String,
}

impl RollingSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.summary
    }

    /// The single system message replayed before the next question
    pub fn context(&self) -> Message {
        Message::system(format!("Previous conversation summary: {}", self.summary))
    }

    /// Ask the model for a new summary. The current summary is only
    /// replaced once the call succeeds.
    pub async fn regenerate(
        &mut self,
        question: &str,
        answer: &str,
        generator: &dyn Generate,
    ) -> crate::Result<()> {
        let prompt = summary_prompt(question, answer, &self.summary);
        let context = [self.context()];

        info!("Regenerating conversation summary");

        match generator.generate(&prompt, &context).await {
            Ok(summary) => {
                info!(summary_chars = summary.len(), "Conversation summary updated");
                self.summary = summary;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to summarize conversation: {}", e);
                Err(e)
            }
        }
    }
}

/// Prompt asking for a 2-3 sentence condensation of the latest exchange
pub fn summary_prompt(question: &str, answer: &str, previous_summary: &str) -> String {
    format!(
        "Summarize the following conversation in 2-3 sentences:\nUser: {}\nAssistant: {}\nPrevious summary: {}",
        question, answer, previous_summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::models::{Role, Vendor};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records what it was asked and answers with a fixed reply
    struct RecordingGenerator {
        reply: Option<String>,
        calls: Mutex<Vec<(String, Vec<Message>)>>,
    }

    #[async_trait]
    impl Generate for RecordingGenerator {
        async fn generate(&self, prompt: &str, context: &[Message]) -> crate::Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), context.to_vec()));
            self.reply
                .clone()
                .ok_or(ChatError::EmptyResponse(Vendor::OpenAi))
        }
    }

    #[test]
    fn test_summary_prompt_format() {
        let prompt = summary_prompt("Who signed the contract?", "The landlord.", "");
        assert_eq!(
            prompt,
            "Summarize the following conversation in 2-3 sentences:\nUser: Who signed the contract?\nAssistant: The landlord.\nPrevious summary: "
        );
    }

    #[test]
    fn test_empty_summary_context() {
        let summary = RollingSummary::new();
        let context = summary.context();
        assert_eq!(context.role(), Role::System);
        assert_eq!(context.content(), "Previous conversation summary: ");
    }

    #[test]
    fn test_regenerate_replays_previous_summary() {
        let generator = RecordingGenerator {
            reply: Some("User asked who signed the contract.".to_string()),
            calls: Mutex::new(Vec::new()),
        };
        let mut summary = RollingSummary::new();

        tokio_test::block_on(summary.regenerate("Who signed the contract?", "The landlord.", &generator))
            .unwrap();
        assert_eq!(summary.text(), "User asked who signed the contract.");

        tokio_test::block_on(summary.regenerate("When does it expire?", "In March.", &generator))
            .unwrap();

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].0.ends_with("Previous summary: User asked who signed the contract."));
        assert_eq!(
            calls[1].1,
            vec![Message::system("Previous conversation summary: User asked who signed the contract.")]
        );
    }

    #[test]
    fn test_failed_regeneration_keeps_summary() {
        let generator = RecordingGenerator {
            reply: None,
            calls: Mutex::new(Vec::new()),
        };
        let mut summary = RollingSummary {
            summary: "Earlier talk.".to_string(),
        };

        let result = tokio_test::block_on(summary.regenerate("Q", "A", &generator));
        assert!(result.is_err());
        assert_eq!(summary.text(), "Earlier talk.");
    }
}
