//! Financial fact extraction
//!
//! Deterministic, rule-based: every raw-text line is checked against an
//! ordered rule list (one rule per category, in priority order) and yields
//! at most one fact. Spreadsheets whose rows carry no labelled lines fall
//! back to their header row.

pub mod numeric;

use crate::models::{
    CellValue, ExtractedContent, FactTable, FinancialFact, MetricCategory, SheetTable,
};
use numeric::{find_amounts, AmountToken};
use std::ops::Range;
use tracing::{debug, info};

/// One category and the keywords that select it
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub category: MetricCategory,
    pub keywords: &'static [&'static str],
}

impl ExtractionRule {
    /// Byte range of the earliest keyword hit in `text`, any case
    fn locate(&self, text: &str) -> Option<Range<usize>> {
        self.category.find_keyword(text)
    }
}

#[derive(Debug, Clone)]
pub struct FactExtractor {
    rules: Vec<ExtractionRule>,
}

impl Default for FactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FactExtractor {
    /// Rules for every category in priority order
    pub fn new() -> Self {
        let rules = MetricCategory::ALL
            .iter()
            .map(|category| ExtractionRule {
                category: *category,
                keywords: category.keywords(),
            })
            .collect();

        Self { rules }
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn extract(&self, content: &ExtractedContent) -> FactTable {
        let mut table = FactTable::new();
        let mut fact_lines = Vec::new();

        for (index, line) in content.lines.iter().enumerate() {
            if let Some(fact) = self.extract_line(index, line) {
                debug!(
                    line = index,
                    category = ?fact.category,
                    label = %fact.label,
                    value = fact.value,
                    "Matched line"
                );
                fact_lines.push(index);
                table.insert(fact);
            }
        }

        if let Some(sheets) = &content.sheets {
            for sheet in sheets {
                let sheet_has_facts = fact_lines.iter().any(|i| sheet.lines.contains(i));
                if sheet_has_facts {
                    continue;
                }
                for fact in self.extract_header_columns(sheet) {
                    debug!(
                        sheet = %sheet.name,
                        category = ?fact.category,
                        label = %fact.label,
                        "Matched header column"
                    );
                    table.insert(fact);
                }
            }
        }

        info!(
            facts = table.len(),
            lines = content.lines.len(),
            "Extraction complete"
        );

        table
    }

    /// First matching rule wins; a label with no amount yields nothing
    pub fn extract_line(&self, index: usize, line: &str) -> Option<FinancialFact> {
        let (rule, keyword) = self
            .rules
            .iter()
            .find_map(|rule| rule.locate(line).map(|hit| (rule, hit)))?;

        let amounts = find_amounts(line);
        let amount = choose_amount(line, &amounts, keyword.end)?;
        let keyword = &line[keyword];

        Some(FinancialFact {
            category: rule.category,
            label: label_for(line, amount, keyword),
            value: amount.value,
            scale: amount.scale,
            currency: amount.currency.clone(),
            line: Some(index),
        })
    }

    /// Header-row columns: label from the header, value from the column's last number
    fn extract_header_columns(&self, sheet: &SheetTable) -> Vec<FinancialFact> {
        let Some(header_index) = sheet.rows.iter().position(|row| is_header_row(row)) else {
            return Vec::new();
        };
        let header = &sheet.rows[header_index];

        let mut facts = Vec::new();
        for (column, cell) in header.iter().enumerate() {
            let CellValue::Text(label) = cell else {
                continue;
            };
            let Some(rule) = self.rules.iter().find(|r| r.locate(label).is_some()) else {
                continue;
            };

            let last_value = sheet.rows[header_index + 1..]
                .iter()
                .filter_map(|row| row.get(column).and_then(CellValue::as_number))
                .last();

            if let Some(value) = last_value {
                facts.push(FinancialFact {
                    category: rule.category,
                    label: label.trim().to_string(),
                    value,
                    scale: None,
                    currency: None,
                    line: None,
                });
            }
        }

        facts
    }
}

fn is_header_row(row: &[CellValue]) -> bool {
    let mut texts = 0;
    for cell in row {
        match cell {
            CellValue::Number(_) => return false,
            CellValue::Text(s) if !s.trim().is_empty() => texts += 1,
            _ => {}
        }
    }
    texts > 0
}

/// Amounts after the keyword win over those before it; within that pool a
/// note reference only counts when nothing else is there
fn choose_amount<'a>(
    line: &str,
    amounts: &'a [AmountToken],
    keyword_end: usize,
) -> Option<&'a AmountToken> {
    let after: Vec<&AmountToken> = amounts.iter().filter(|a| a.start >= keyword_end).collect();
    let pool = if after.is_empty() {
        amounts.iter().collect()
    } else {
        after
    };

    pool.iter()
        .find(|a| !is_note_reference(line, a))
        .or_else(|| pool.first())
        .copied()
}

/// A bare integer under 100, like the `3` in `(Note 3)`
fn is_note_reference(line: &str, amount: &AmountToken) -> bool {
    amount.currency.is_none()
        && amount.scale.is_none()
        && amount.value.abs() < 100.0
        && line[amount.start..amount.end]
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '(' | ')' | '-'))
}

const LABEL_TRIM: &[char] = &[':', '-', '=', '|', '\t', ' ', '.'];

/// Text before the amount, else text after it, else the keyword itself
fn label_for(line: &str, amount: &AmountToken, keyword: &str) -> String {
    let before = line[..amount.start].trim().trim_end_matches(LABEL_TRIM).trim();
    if !before.is_empty() {
        return before.to_string();
    }

    let after = line[amount.end..].trim().trim_start_matches(LABEL_TRIM).trim();
    if !after.is_empty() {
        return after.to_string();
    }

    keyword.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::spreadsheet::{flatten_sheets, RawSheet};
    use crate::models::{Scale, TextStatus};

    fn extract_text(text: &str) -> FactTable {
        FactExtractor::new().extract(&ExtractedContent::from_text(text))
    }

    #[test]
    fn test_reference_document() {
        let table = extract_text("Total Revenue: $1,200,000\nNet Profit: $300,000");

        let revenue = table.get(MetricCategory::Revenue);
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].label, "Total Revenue");
        assert_eq!(revenue[0].value, 1_200_000.0);
        assert_eq!(revenue[0].currency.as_deref(), Some("$"));

        let profit = table.get(MetricCategory::Profit);
        assert_eq!(profit.len(), 1);
        assert_eq!(profit[0].label, "Net Profit");
        assert_eq!(profit[0].value, 300_000.0);

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ambiguous_line_counts_once_under_highest_priority() {
        let cases = [
            ("Total revenue and profit: 900", MetricCategory::Revenue),
            ("Profit after expenses 120", MetricCategory::Profit),
            ("Operating expenses incl. debt service 75", MetricCategory::Expense),
            ("Total assets net of liabilities 40", MetricCategory::Asset),
        ];

        for (line, expected) in cases {
            let table = extract_text(line);
            assert_eq!(table.len(), 1, "{}", line);
            assert_eq!(table.get(expected).len(), 1, "{}", line);
        }
    }

    #[test]
    fn test_label_without_amount_yields_nothing() {
        let table = extract_text("Revenue\nNet profit was strong this year\nTotal assets: n/a");
        assert!(table.is_empty());
    }

    #[test]
    fn test_lines_without_keywords_are_ignored() {
        let table = extract_text("Headcount: 1,200\nOffices: 14");
        assert!(table.is_empty());
    }

    #[test]
    fn test_multiple_facts_per_category_keep_source_order() {
        let table = extract_text(
            "Total Revenue: $1,200,000\nNet Revenue: $1,100,000\nGross Revenue: $1,200,000",
        );
        let revenue = table.get(MetricCategory::Revenue);
        let labels: Vec<&str> = revenue.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Total Revenue", "Net Revenue", "Gross Revenue"]);
        assert_eq!(revenue[0].line, Some(0));
        assert_eq!(revenue[2].line, Some(2));
    }

    #[test]
    fn test_amount_after_keyword_is_preferred() {
        let table = extract_text("FY2023 Sales (2022) 4.5M");
        let revenue = table.get(MetricCategory::Revenue);
        assert_eq!(revenue[0].value, 4_500_000.0);
        assert_eq!(revenue[0].scale, Some(Scale::Million));
        assert_eq!(revenue[0].label, "FY2023 Sales (2022)");
    }

    #[test]
    fn test_amount_before_keyword_is_accepted() {
        let table = extract_text("$2.3M in total liabilities");
        let liabilities = table.get(MetricCategory::Liability);
        assert_eq!(liabilities[0].value, 2_300_000.0);
        assert_eq!(liabilities[0].label, "in total liabilities");
    }

    #[test]
    fn test_parenthesized_values_are_negative() {
        let table = extract_text("Net income (loss): (500)");
        let profit = table.get(MetricCategory::Profit);
        assert_eq!(profit[0].value, -500.0);
    }

    #[test]
    fn test_empty_content_yields_empty_table() {
        let content = ExtractedContent::from_text("");
        assert_eq!(content.status, TextStatus::NoTextExtracted);
        assert!(FactExtractor::new().extract(&content).is_empty());
    }

    #[test]
    fn test_spreadsheet_rows_are_scanned_as_lines() {
        let content = flatten_sheets(vec![RawSheet {
            name: "Income".into(),
            rows: vec![
                vec![
                    CellValue::Text("Total Revenue".into()),
                    CellValue::Number(1_200_000.0),
                ],
                vec![
                    CellValue::Text("Operating Expenses".into()),
                    CellValue::Number(-400_000.0),
                ],
            ],
        }]);

        let table = FactExtractor::new().extract(&content);
        assert_eq!(table.get(MetricCategory::Revenue)[0].value, 1_200_000.0);
        assert_eq!(table.get(MetricCategory::Expense)[0].value, -400_000.0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_header_columns_use_last_value() {
        let content = flatten_sheets(vec![RawSheet {
            name: "Summary".into(),
            rows: vec![
                vec![
                    CellValue::Text("Quarter".into()),
                    CellValue::Text("Revenue".into()),
                    CellValue::Text("Net Income".into()),
                    CellValue::Text("Notes".into()),
                ],
                vec![
                    CellValue::Text("Q1".into()),
                    CellValue::Number(100.0),
                    CellValue::Number(10.0),
                    CellValue::Empty,
                ],
                vec![
                    CellValue::Text("Q2".into()),
                    CellValue::Number(150.0),
                    CellValue::Number(20.0),
                    CellValue::Empty,
                ],
                vec![
                    CellValue::Text("Total".into()),
                    CellValue::Number(250.0),
                    CellValue::Number(30.0),
                    CellValue::Empty,
                ],
            ],
        }]);

        let table = FactExtractor::new().extract(&content);
        let revenue = table.get(MetricCategory::Revenue);
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].label, "Revenue");
        assert_eq!(revenue[0].value, 250.0);
        assert_eq!(revenue[0].line, None);
        assert_eq!(table.get(MetricCategory::Profit)[0].value, 30.0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_header_fallback_skipped_when_rows_matched() {
        let content = flatten_sheets(vec![RawSheet {
            name: "Mixed".into(),
            rows: vec![
                vec![
                    CellValue::Text("Item".into()),
                    CellValue::Text("Revenue".into()),
                ],
                vec![
                    CellValue::Text("Total revenue".into()),
                    CellValue::Number(500.0),
                ],
            ],
        }]);

        let table = FactExtractor::new().extract(&content);
        assert_eq!(table.get(MetricCategory::Revenue).len(), 1);
        assert_eq!(table.get(MetricCategory::Revenue)[0].label, "Total revenue");
    }

    #[test]
    fn test_case_changing_characters_do_not_break_offsets() {
        let line = "\u{212A} revenue \u{130}\u{130} 5";
        assert_eq!(line.to_lowercase().len(), line.len());

        let fact = FactExtractor::new().extract_line(0, line).unwrap();
        assert_eq!(fact.category, MetricCategory::Revenue);
        assert_eq!(fact.value, 5.0);
        assert!(fact.label.contains("revenue"));
    }

    #[test]
    fn test_note_references_are_skipped() {
        let table = extract_text("Revenue (Note 3) 1,200,000\nTotal assets net of liabilities 40");
        assert_eq!(table.get(MetricCategory::Revenue)[0].value, 1_200_000.0);
        assert_eq!(table.get(MetricCategory::Revenue)[0].label, "Revenue (Note 3)");
        assert_eq!(table.get(MetricCategory::Asset)[0].value, 40.0);
    }

    #[test]
    fn test_rules_follow_priority_order() {
        let order: Vec<_> = FactExtractor::new()
            .rules()
            .iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(order, MetricCategory::ALL.to_vec());
    }
}
