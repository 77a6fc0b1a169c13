//! Question matcher
//!
//! Pure function of (question, fact table) → answer. Conversation history
//! is never consulted.

use crate::classifier::QuestionClassifier;
use crate::models::{Answer, FactTable, FinancialFact, MetricCategory, QuestionTopic};
use tracing::debug;

pub const UNKNOWN_TOPIC_MESSAGE: &str = "I couldn't match your question to a financial topic. \
Try asking about revenue, profit, expenses, assets or liabilities, \
or ask for a summary of the document.";

pub const EMPTY_SUMMARY_MESSAGE: &str =
    "I analyzed the document but couldn't identify any financial figures in it.";

/// Example questions shown before the first question is asked
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "What was the total revenue?",
    "How much profit was reported?",
    "What were the total expenses?",
    "What are the company's total assets?",
    "What are the total liabilities?",
    "How did the company perform financially?",
];

pub struct QuestionMatcher;

impl QuestionMatcher {
    pub fn answer(question: &str, facts: &FactTable) -> Answer {
        let topic = QuestionClassifier::classify(question);
        debug!(question = %question, topic = ?topic, "Classified question");

        match (topic, topic.metric()) {
            (_, Some(category)) => render_category(topic, category, facts.get(category)),
            (QuestionTopic::General, None) => render_summary(facts),
            _ => Answer {
                topic: QuestionTopic::Unknown,
                text: UNKNOWN_TOPIC_MESSAGE.to_string(),
                facts: Vec::new(),
            },
        }
    }
}

fn render_category(
    topic: QuestionTopic,
    category: MetricCategory,
    facts: &[FinancialFact],
) -> Answer {
    let text = match facts {
        [] => format!(
            "The document did not contain an identifiable {} figure.",
            category.name()
        ),
        [only] => format!("Based on the document, {}.", describe_fact(only)),
        many => {
            let listed: Vec<String> = many.iter().map(describe_fact).collect();
            format!(
                "The document reports {} {} figures: {}.",
                many.len(),
                category.name(),
                listed.join("; ")
            )
        }
    };

    Answer {
        topic,
        text,
        facts: facts.to_vec(),
    }
}

fn render_summary(facts: &FactTable) -> Answer {
    if facts.is_empty() {
        return Answer {
            topic: QuestionTopic::General,
            text: EMPTY_SUMMARY_MESSAGE.to_string(),
            facts: Vec::new(),
        };
    }

    let mut text = String::from("Here is what the document reports:");
    for (category, group) in facts.iter() {
        let figures: Vec<String> = group
            .iter()
            .map(|fact| format!("{} {}", fact.label, format_value(fact)))
            .collect();
        text.push_str(&format!("\n• {}: {}", category, figures.join("; ")));
    }

    Answer {
        topic: QuestionTopic::General,
        text,
        facts: facts.all_facts().cloned().collect(),
    }
}

/// `<label> is <compact> (<exact>)`
pub fn describe_fact(fact: &FinancialFact) -> String {
    format!("{} is {}", fact.label, format_value(fact))
}

/// Compact form with the exact figure in parentheses when they differ
pub fn format_value(fact: &FinancialFact) -> String {
    let symbol = fact.currency.as_deref().unwrap_or("$");
    let compact = format_compact(fact.value, symbol);
    let exact = format_exact(fact.value, symbol);
    if compact == exact {
        compact
    } else {
        format!("{} ({})", compact, exact)
    }
}

/// `$1.2M`, `$300K`, `-$4.5B`, `$950`
pub fn format_compact(value: f64, symbol: &str) -> String {
    const SUFFIXES: [(f64, &str); 4] = [(1.0, ""), (1e3, "K"), (1e6, "M"), (1e9, "B")];

    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let mut tier = SUFFIXES
        .iter()
        .rposition(|(divisor, _)| abs >= *divisor)
        .unwrap_or(0);
    let mut rendered = trim_decimals(abs / SUFFIXES[tier].0);

    // Rounding can carry into the next tier: 999,999 is $1M, not $1000K
    if tier + 1 < SUFFIXES.len() && rendered.parse::<f64>().map_or(false, |v| v >= 1000.0) {
        tier += 1;
        rendered = trim_decimals(abs / SUFFIXES[tier].0);
    }

    format!("{}{}{}{}", sign, symbol, rendered, SUFFIXES[tier].1)
}

/// `$1,200,000`, `-$500`, `$1,234.56`
pub fn format_exact(value: f64, symbol: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    let rendered = if abs.fract() == 0.0 {
        format!("{:.0}", abs)
    } else {
        format!("{:.2}", abs)
    };
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let mut out = format!("{}{}{}", sign, symbol, group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn trim_decimals(value: f64) -> String {
    let rendered = format!("{:.2}", value);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::FactExtractor;
    use crate::models::ExtractedContent;

    fn reference_table() -> FactTable {
        let content =
            ExtractedContent::from_text("Total Revenue: $1,200,000\nNet Profit: $300,000");
        FactExtractor::new().extract(&content)
    }

    #[test]
    fn test_revenue_question_references_fact() {
        let answer = QuestionMatcher::answer("What was the total revenue?", &reference_table());
        assert_eq!(answer.topic, QuestionTopic::Revenue);
        assert!(answer.text.contains("$1,200,000"), "{}", answer.text);
        assert!(answer.text.contains("$1.2M"), "{}", answer.text);
        assert_eq!(answer.facts.len(), 1);
        assert_eq!(answer.facts[0].value, 1_200_000.0);
    }

    #[test]
    fn test_missing_category_says_not_found() {
        let answer = QuestionMatcher::answer("What are total assets?", &reference_table());
        assert_eq!(answer.topic, QuestionTopic::Asset);
        assert_eq!(
            answer.text,
            "The document did not contain an identifiable asset figure."
        );
        assert!(answer.facts.is_empty());
    }

    #[test]
    fn test_unknown_question_gets_fallback() {
        let answer = QuestionMatcher::answer("tell me a joke", &reference_table());
        assert_eq!(answer.topic, QuestionTopic::Unknown);
        assert_eq!(answer.text, UNKNOWN_TOPIC_MESSAGE);
        assert!(answer.text.contains("revenue"));
        assert!(answer.facts.is_empty());
    }

    #[test]
    fn test_every_fact_is_listed_without_aggregation() {
        let content = ExtractedContent::from_text(
            "Total Revenue: $1,200,000\nNet Revenue: $1,100,000",
        );
        let table = FactExtractor::new().extract(&content);

        let answer = QuestionMatcher::answer("revenue?", &table);
        assert_eq!(answer.facts.len(), 2);
        assert!(answer.text.starts_with("The document reports 2 revenue figures"));
        assert!(answer.text.contains("Total Revenue is $1.2M ($1,200,000)"));
        assert!(answer.text.contains("Net Revenue is $1.1M ($1,100,000)"));
    }

    #[test]
    fn test_summary_skips_empty_categories() {
        let answer = QuestionMatcher::answer("Give me an overview", &reference_table());
        assert_eq!(answer.topic, QuestionTopic::General);

        let lines: Vec<&str> = answer.text.lines().skip(1).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("• Revenue:"));
        assert!(lines[1].starts_with("• Profit:"));
        assert_eq!(answer.facts.len(), 2);
    }

    #[test]
    fn test_summary_of_empty_table() {
        let answer = QuestionMatcher::answer("summary", &FactTable::new());
        assert_eq!(answer.topic, QuestionTopic::General);
        assert_eq!(answer.text, EMPTY_SUMMARY_MESSAGE);
    }

    #[test]
    fn test_compact_formatting() {
        assert_eq!(format_compact(1_200_000.0, "$"), "$1.2M");
        assert_eq!(format_compact(300_000.0, "$"), "$300K");
        assert_eq!(format_compact(-4_500_000_000.0, "$"), "-$4.5B");
        assert_eq!(format_compact(950.0, "€"), "€950");
        assert_eq!(format_compact(1_234_567.0, "$"), "$1.23M");
        assert_eq!(format_compact(0.5, "$"), "$0.5");
    }

    #[test]
    fn test_compact_rounding_carries_to_next_suffix() {
        assert_eq!(format_compact(999_999.0, "$"), "$1M");
        assert_eq!(format_compact(999_999_999.0, "$"), "$1B");
        assert_eq!(format_compact(999.999, "$"), "$1K");
        assert_eq!(format_compact(-999_996.0, "$"), "-$1M");
        assert_eq!(format_compact(999_994.0, "$"), "$999.99K");
    }

    #[test]
    fn test_exact_formatting() {
        assert_eq!(format_exact(1_200_000.0, "$"), "$1,200,000");
        assert_eq!(format_exact(-500.0, "$"), "-$500");
        assert_eq!(format_exact(1234.56, "$"), "$1,234.56");
        assert_eq!(format_exact(100.0, "£"), "£100");
    }
}
