//! Message buffers backing the buffered memory strategies
//!
//! Both buffers keep messages oldest-first in a `VecDeque` and evict from
//! the front.

use crate::models::Message;
use serde::Serialize;
use std::collections::VecDeque;

/// Messages kept by the fixed-size buffer
pub const MESSAGE_WINDOW_CAPACITY: usize = 5;

/// Word ceiling of the word-budget buffer
pub const WORD_BUDGET_CEILING: usize = 5000;

/// Fixed-capacity FIFO of the most recent messages.
///
/// Capacity counts messages, not exchanges, so five slots hold the last
/// two and a half question/answer pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageWindow {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl MessageWindow {
    pub fn new() -> Self {
        Self::with_capacity(MESSAGE_WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append one message, evicting the oldest when over capacity
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Append the question, then the answer
    pub fn record(&mut self, question: &str, answer: &str) {
        self.push(Message::user(question));
        self.push(Message::assistant(answer));
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MessageWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages plus a running whitespace word total, bounded by a ceiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordBudgetBuffer {
    messages: VecDeque<Message>,
    total_words: usize,
    ceiling: usize,
}

impl WordBudgetBuffer {
    pub fn new() -> Self {
        Self::with_ceiling(WORD_BUDGET_CEILING)
    }

    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            total_words: 0,
            ceiling,
        }
    }

    /// Append the exchange, then evict from the front until back under budget
    pub fn record(&mut self, question: &str, answer: &str) -> usize {
        self.add_message(Message::user(question));
        self.add_message(Message::assistant(answer));
        self.evict_over_budget()
    }

    fn add_message(&mut self, message: Message) {
        self.total_words += message.word_count();
        self.messages.push_back(message);
    }

    /// Remove oldest message and return it
    fn remove_oldest(&mut self) -> Option<Message> {
        let msg = self.messages.pop_front();

        if let Some(ref m) = msg {
            self.total_words = self.total_words.saturating_sub(m.word_count());
        }

        msg
    }

    /// Returns how many messages were evicted. Stops once the buffer is
    /// empty even if the total is still over the ceiling.
    fn evict_over_budget(&mut self) -> usize {
        let mut evicted = 0;
        while self.total_words > self.ceiling {
            if self.remove_oldest().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn total_words(&self) -> usize {
        self.total_words
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for WordBudgetBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn words(n: usize) -> String {
        vec!["w"; n].join(" ")
    }

    fn contents<'a>(messages: impl Iterator<Item = &'a Message>) -> Vec<String> {
        messages.map(|m| m.content().to_string()).collect()
    }

    #[test]
    fn test_window_keeps_last_five_of_six() {
        let mut window = MessageWindow::new();
        window.record("Q1", "A1");
        window.record("Q2", "A2");
        window.record("Q3", "A3");

        assert_eq!(window.len(), 5);
        assert_eq!(contents(window.messages()), vec!["A1", "Q2", "A2", "Q3", "A3"]);
        let roles: Vec<Role> = window.messages().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = MessageWindow::new();
        for i in 0..20 {
            window.record(&format!("Q{}", i), &format!("A{}", i));
            assert!(window.len() <= MESSAGE_WINDOW_CAPACITY);
        }
        assert_eq!(
            contents(window.messages()),
            vec!["A17", "Q18", "A18", "Q19", "A19"]
        );
    }

    #[test]
    fn test_budget_total_matches_buffered_words() {
        let mut buffer = WordBudgetBuffer::with_ceiling(10);
        buffer.record("one two three", "four five");
        assert_eq!(buffer.total_words(), 5);
        assert_eq!(buffer.len(), 2);

        let evicted = buffer.record("a b c d", "e f g");
        assert_eq!(evicted, 1);
        assert_eq!(buffer.total_words(), 9);
        assert_eq!(contents(buffer.messages()), vec!["four five", "a b c d", "e f g"]);

        let recount: usize = buffer.messages().map(|m| m.word_count()).sum();
        assert_eq!(recount, buffer.total_words());
    }

    #[test]
    fn test_budget_invariant_over_many_exchanges() {
        let mut buffer = WordBudgetBuffer::new();
        for i in 0..40 {
            buffer.record(&words(100 + i), &words(250));
            assert!(buffer.total_words() <= WORD_BUDGET_CEILING || buffer.is_empty());
            let recount: usize = buffer.messages().map(|m| m.word_count()).sum();
            assert_eq!(recount, buffer.total_words());
        }
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_oversized_exchange_empties_buffer_without_underflow() {
        let mut buffer = WordBudgetBuffer::with_ceiling(3);
        buffer.record("a b", "c");
        buffer.record(&words(10), &words(10));

        assert!(buffer.is_empty());
        assert_eq!(buffer.total_words(), 0);
    }

    #[test]
    fn test_oversized_answer_keeps_nothing_but_stops_cleanly() {
        let mut buffer = WordBudgetBuffer::with_ceiling(5);
        let evicted = buffer.record("short", &words(6));
        assert_eq!(evicted, 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_words(), 0);
    }
}
