//! Question Classifier
//!
//! Maps a free-text question to a topic:
//! - One of the metric categories (revenue, profit, expense, asset, liability)
//! - General: summary / overview requests
//! - Unknown: nothing recognised

use crate::models::{MetricCategory, QuestionTopic};

/// Static keyword list
const GENERAL_KEYWORDS: &[&str] = &[
    "summary",
    "summarize",
    "summarise",
    "overview",
    "how did the company perform",
    "performance",
    "key figures",
    "highlights",
];

/// Question classifier
pub struct QuestionClassifier;

impl QuestionClassifier {
    /// Metric categories first (in priority order), then general, else unknown
    pub fn classify(question: &str) -> QuestionTopic {
        if let Some((category, _)) = MetricCategory::first_match(question) {
            return category.into();
        }

        if contains_general_terms(&question.to_lowercase()) {
            QuestionTopic::General
        } else {
            QuestionTopic::Unknown
        }
    }
}

/// Fast path summary detection
fn contains_general_terms(text: &str) -> bool {
    GENERAL_KEYWORDS.iter().any(|kw| text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_questions() {
        let cases = vec![
            ("What was the total revenue?", QuestionTopic::Revenue),
            ("How much profit was reported?", QuestionTopic::Profit),
            ("What is the net income?", QuestionTopic::Profit),
            ("What were the total expenses?", QuestionTopic::Expense),
            ("What are the company's total assets?", QuestionTopic::Asset),
            ("How much debt does it carry?", QuestionTopic::Liability),
        ];

        for (question, expected) in cases {
            assert_eq!(QuestionClassifier::classify(question), expected, "{}", question);
        }
    }

    #[test]
    fn test_keyword_position_does_not_matter() {
        for category in MetricCategory::ALL {
            for keyword in category.keywords() {
                let variants = [
                    format!("{} please", keyword),
                    format!("tell me about the {} figure", keyword),
                    format!("what was it, the {}", keyword.to_uppercase()),
                ];
                for question in variants {
                    let topic = QuestionClassifier::classify(&question);
                    assert_eq!(topic, QuestionTopic::from(category), "{}", question);
                }
            }
        }
    }

    #[test]
    fn test_general_questions() {
        let cases = vec![
            "Give me a summary",
            "How did the company perform financially?",
            "Overview of the report",
        ];

        for c in cases {
            assert_eq!(QuestionClassifier::classify(c), QuestionTopic::General, "{}", c);
        }
    }

    #[test]
    fn test_metric_beats_general() {
        assert_eq!(
            QuestionClassifier::classify("Summarize the revenue performance"),
            QuestionTopic::Revenue
        );
    }

    #[test]
    fn test_edge_cases() {
        assert_eq!(QuestionClassifier::classify("tell me a joke"), QuestionTopic::Unknown);
        assert_eq!(QuestionClassifier::classify(""), QuestionTopic::Unknown);
        assert_eq!(QuestionClassifier::classify("hi"), QuestionTopic::Unknown);
    }
}
