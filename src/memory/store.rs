//! Conversation history storage
//!
//! Stores question/answer exchanges with timestamps

use crate::models::Answer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// A single question and the answer given to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaExchange {
    pub exchange_id: Uuid,
    pub asked_at: DateTime<Utc>,
    pub question: String,
    pub answer: Answer,
}

impl QaExchange {
    pub fn new(question: String, answer: Answer) -> Self {
        Self {
            exchange_id: Uuid::new_v4(),
            asked_at: Utc::now(),
            question,
            answer,
        }
    }

    /// Two transcript lines: the question and the answer
    pub fn transcript_entry(&self) -> String {
        let at = self.asked_at.format("%H:%M:%S");
        format!("[{}] You: {}\n[{}] Assistant: {}\n\n", at, self.question, at, self.answer.text)
    }
}

/// Conversation history for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Exchanges in order (VecDeque for cheap trimming from the front)
    exchanges: VecDeque<QaExchange>,
    /// Oldest exchanges are dropped beyond this many
    limit: usize,
}

impl ConversationHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: Utc::now(),
            exchanges: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Append an exchange, trimming the oldest past the limit
    pub fn record(&mut self, exchange: QaExchange) {
        self.exchanges.push_back(exchange);
        while self.exchanges.len() > self.limit {
            self.exchanges.pop_front();
        }
        self.updated_at = Utc::now();
    }

    // =============================
    // Iterators (ZERO ALLOCATION)
    // =============================

    /// Iterate over all exchanges, oldest first
    pub fn exchanges(&self) -> impl Iterator<Item = &QaExchange> {
        self.exchanges.iter()
    }

    /// Iterate over the N most recent exchanges, newest first
    pub fn recent(&self, count: usize) -> impl DoubleEndedIterator<Item = &QaExchange> {
        self.exchanges.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Transcript for terminal display
    pub fn formatted_transcript(&self) -> String {
        self.exchanges.iter().map(QaExchange::transcript_entry).collect()
    }

    /// Clear history
    pub fn clear(&mut self) {
        self.exchanges.clear();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionTopic;

    fn answer(topic: QuestionTopic, text: &str) -> Answer {
        Answer {
            topic,
            text: text.to_string(),
            facts: Vec::new(),
        }
    }

    #[test]
    fn test_exchange_creation() {
        let exchange = QaExchange::new(
            "What was the revenue?".to_string(),
            answer(QuestionTopic::Revenue, "Revenue is $1.2M"),
        );
        assert_eq!(exchange.question, "What was the revenue?");
        assert!(exchange.asked_at <= Utc::now());
    }

    #[test]
    fn test_history_keeps_order() {
        let mut history = ConversationHistory::new(10);

        history.record(QaExchange::new(
            "revenue?".into(),
            answer(QuestionTopic::Revenue, "a"),
        ));
        history.record(QaExchange::new(
            "joke?".into(),
            answer(QuestionTopic::Unknown, "b"),
        ));

        assert_eq!(history.len(), 2);
        let questions: Vec<&str> = history.exchanges().map(|e| e.question.as_str()).collect();
        assert_eq!(questions, vec!["revenue?", "joke?"]);
        assert_eq!(history.recent(1).next().unwrap().question, "joke?");
        let newest_first: Vec<&str> = history.recent(5).map(|e| e.question.as_str()).collect();
        assert_eq!(newest_first, vec!["joke?", "revenue?"]);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = ConversationHistory::new(5);

        for i in 0..10 {
            history.record(QaExchange::new(
                format!("Question {}", i),
                answer(QuestionTopic::Unknown, "n/a"),
            ));
        }

        assert_eq!(history.len(), 5);
        assert_eq!(history.exchanges().next().unwrap().question, "Question 5");
    }

    #[test]
    fn test_clear_and_transcript() {
        let mut history = ConversationHistory::new(10);
        history.record(QaExchange::new(
            "summary".into(),
            answer(QuestionTopic::General, "Here is what the document reports:"),
        ));

        let transcript = history.formatted_transcript();
        assert!(transcript.contains("You: summary"));
        assert!(transcript.contains("Assistant: Here is what the document reports:"));

        history.clear();
        assert!(history.is_empty());
        assert!(history.formatted_transcript().is_empty());
    }
}
