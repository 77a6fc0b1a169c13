//! Core data models for the financial document assistant

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

//
// ================= Categories =================
//

/// Canonical metric category. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Revenue,
    Profit,
    Expense,
    Asset,
    Liability,
}

/// Static keyword lists, lowercase
const REVENUE_KEYWORDS: &[&str] = &["revenue", "sales", "total income", "turnover"];
const PROFIT_KEYWORDS: &[&str] = &["net profit", "net income", "earnings", "profit"];
const EXPENSE_KEYWORDS: &[&str] = &[
    "expense",
    "operating cost",
    "cost of goods sold",
    "cogs",
    "costs",
];
const ASSET_KEYWORDS: &[&str] = &["total assets", "current assets", "fixed assets", "assets"];
const LIABILITY_KEYWORDS: &[&str] = &[
    "liabilities",
    "liability",
    "accounts payable",
    "debt",
    "loan",
];

lazy_static! {
    static ref REVENUE_PATTERN: Regex = keyword_pattern(REVENUE_KEYWORDS);
    static ref PROFIT_PATTERN: Regex = keyword_pattern(PROFIT_KEYWORDS);
    static ref EXPENSE_PATTERN: Regex = keyword_pattern(EXPENSE_KEYWORDS);
    static ref ASSET_PATTERN: Regex = keyword_pattern(ASSET_KEYWORDS);
    static ref LIABILITY_PATTERN: Regex = keyword_pattern(LIABILITY_KEYWORDS);
}

/// Case-insensitive alternation; leftmost match, ties go to the earlier keyword
fn keyword_pattern(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation)
        .case_insensitive(true)
        .build()
        .expect("keyword pattern compiles")
}

impl MetricCategory {
    /// All categories in priority order
    pub const ALL: [MetricCategory; 5] = [
        MetricCategory::Revenue,
        MetricCategory::Profit,
        MetricCategory::Expense,
        MetricCategory::Asset,
        MetricCategory::Liability,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            MetricCategory::Revenue => REVENUE_KEYWORDS,
            MetricCategory::Profit => PROFIT_KEYWORDS,
            MetricCategory::Expense => EXPENSE_KEYWORDS,
            MetricCategory::Asset => ASSET_KEYWORDS,
            MetricCategory::Liability => LIABILITY_KEYWORDS,
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            MetricCategory::Revenue => &REVENUE_PATTERN,
            MetricCategory::Profit => &PROFIT_PATTERN,
            MetricCategory::Expense => &EXPENSE_PATTERN,
            MetricCategory::Asset => &ASSET_PATTERN,
            MetricCategory::Liability => &LIABILITY_PATTERN,
        }
    }

    /// Byte range of the earliest keyword of this category in `text`, any case
    pub fn find_keyword(self, text: &str) -> Option<Range<usize>> {
        self.pattern().find(text).map(|m| m.range())
    }

    /// Highest-priority category with a keyword in `text`
    pub fn first_match(text: &str) -> Option<(MetricCategory, Range<usize>)> {
        Self::ALL
            .iter()
            .find_map(|category| category.find_keyword(text).map(|range| (*category, range)))
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricCategory::Revenue => "revenue",
            MetricCategory::Profit => "profit",
            MetricCategory::Expense => "expense",
            MetricCategory::Asset => "asset",
            MetricCategory::Liability => "liability",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MetricCategory::Revenue => "Revenue",
            MetricCategory::Profit => "Profit",
            MetricCategory::Expense => "Expenses",
            MetricCategory::Asset => "Assets",
            MetricCategory::Liability => "Liabilities",
        };
        write!(f, "{}", s)
    }
}

/// Topic a question was classified into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionTopic {
    Revenue,
    Profit,
    Expense,
    Asset,
    Liability,
    General,
    Unknown,
}

impl QuestionTopic {
    pub fn metric(self) -> Option<MetricCategory> {
        match self {
            QuestionTopic::Revenue => Some(MetricCategory::Revenue),
            QuestionTopic::Profit => Some(MetricCategory::Profit),
            QuestionTopic::Expense => Some(MetricCategory::Expense),
            QuestionTopic::Asset => Some(MetricCategory::Asset),
            QuestionTopic::Liability => Some(MetricCategory::Liability),
            QuestionTopic::General | QuestionTopic::Unknown => None,
        }
    }
}

impl From<MetricCategory> for QuestionTopic {
    fn from(category: MetricCategory) -> Self {
        match category {
            MetricCategory::Revenue => QuestionTopic::Revenue,
            MetricCategory::Profit => QuestionTopic::Profit,
            MetricCategory::Expense => QuestionTopic::Expense,
            MetricCategory::Asset => QuestionTopic::Asset,
            MetricCategory::Liability => QuestionTopic::Liability,
        }
    }
}

//
// ================= Facts =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Thousand,
    Million,
    Billion,
}

impl Scale {
    pub fn multiplier(self) -> f64 {
        match self {
            Scale::Thousand => 1_000.0,
            Scale::Million => 1_000_000.0,
            Scale::Billion => 1_000_000_000.0,
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Scale> {
        match suffix.to_lowercase().as_str() {
            "k" | "thousand" => Some(Scale::Thousand),
            "m" | "mn" | "million" => Some(Scale::Million),
            "b" | "bn" | "billion" => Some(Scale::Billion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialFact {
    pub category: MetricCategory,
    /// Label text as found in the source
    pub label: String,
    /// Normalized value with scale and sign applied
    pub value: f64,
    pub scale: Option<Scale>,
    pub currency: Option<String>,
    /// Index into the raw-text lines; `None` for spreadsheet column facts
    pub line: Option<usize>,
}

/// Facts grouped by category, each group in detection order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FactTable {
    facts: BTreeMap<MetricCategory, Vec<FinancialFact>>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyed by the fact's own category, so a group never holds a foreign fact
    pub fn insert(&mut self, fact: FinancialFact) {
        self.facts.entry(fact.category).or_default().push(fact);
    }

    pub fn get(&self, category: MetricCategory) -> &[FinancialFact] {
        self.facts.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty groups in priority order
    pub fn iter(&self) -> impl Iterator<Item = (MetricCategory, &[FinancialFact])> {
        self.facts
            .iter()
            .filter(|(_, facts)| !facts.is_empty())
            .map(|(category, facts)| (*category, facts.as_slice()))
    }

    pub fn all_facts(&self) -> impl Iterator<Item = &FinancialFact> {
        self.facts.values().flat_map(|facts| facts.iter())
    }

    pub fn len(&self) -> usize {
        self.facts.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> BTreeMap<MetricCategory, usize> {
        self.iter().map(|(category, facts)| (category, facts.len())).collect()
    }
}

//
// ================= Answers =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub topic: QuestionTopic,
    pub text: String,
    pub facts: Vec<FinancialFact>,
}

//
// ================= Documents =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Xlsx,
    Xls,
}

impl DocumentFormat {
    pub fn is_spreadsheet(self) -> bool {
        matches!(self, DocumentFormat::Xlsx | DocumentFormat::Xls)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Xlsx => "Excel (XLSX)",
            DocumentFormat::Xls => "Excel (XLS)",
        };
        write!(f, "{}", s)
    }
}

/// File details shown after an upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentInfo {
    pub file_name: String,
    pub size_bytes: usize,
    pub format: DocumentFormat,
    pub sha256: String,
}

impl DocumentInfo {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s.trim()),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{:.0}", n),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Empty => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
    /// Raw-text lines produced by flattening this sheet's rows
    pub lines: Range<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextStatus {
    Extracted,
    /// The document parsed but every page or sheet was empty
    NoTextExtracted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedContent {
    pub lines: Vec<String>,
    pub sheets: Option<Vec<SheetTable>>,
    pub status: TextStatus,
    pub anomalies: Vec<String>,
}

impl ExtractedContent {
    /// Plain text split into trimmed, non-blank lines
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        let status = if lines.is_empty() {
            TextStatus::NoTextExtracted
        } else {
            TextStatus::Extracted
        };

        Self {
            lines,
            sheets: None,
            status,
            anomalies: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn row_count(&self) -> usize {
        self.sheets
            .as_ref()
            .map(|sheets| sheets.iter().map(|s| s.rows.len()).sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(category: MetricCategory, label: &str, value: f64) -> FinancialFact {
        FinancialFact {
            category,
            label: label.to_string(),
            value,
            scale: None,
            currency: Some("$".to_string()),
            line: None,
        }
    }

    #[test]
    fn test_first_match_respects_priority() {
        let (category, range) = MetricCategory::first_match("Total Revenue and profit").unwrap();
        assert_eq!(category, MetricCategory::Revenue);
        assert_eq!(range, 6..13);

        let (category, _) = MetricCategory::first_match("NET INCOME after debt").unwrap();
        assert_eq!(category, MetricCategory::Profit);

        assert!(MetricCategory::first_match("tell me a joke").is_none());
    }

    #[test]
    fn test_keyword_offsets_survive_case_changing_characters() {
        // U+212A lowercases to one byte, U+0130 to three
        let line = "\u{212A} Revenue \u{130}\u{130} 5";
        let range = MetricCategory::Revenue.find_keyword(line).unwrap();
        assert_eq!(&line[range], "Revenue");

        let range = MetricCategory::Profit.find_keyword("\u{130}\u{130} Net Profit").unwrap();
        assert_eq!(range.start, 5);
    }

    #[test]
    fn test_fact_table_groups_in_detection_order() {
        let mut table = FactTable::new();
        table.insert(fact(MetricCategory::Profit, "Net Profit", 300.0));
        table.insert(fact(MetricCategory::Revenue, "Total Revenue", 1200.0));
        table.insert(fact(MetricCategory::Revenue, "Net Revenue", 1100.0));

        assert_eq!(table.len(), 3);
        let revenue = table.get(MetricCategory::Revenue);
        assert_eq!(revenue[0].label, "Total Revenue");
        assert_eq!(revenue[1].label, "Net Revenue");
        assert!(table.get(MetricCategory::Asset).is_empty());

        let order: Vec<_> = table.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![MetricCategory::Revenue, MetricCategory::Profit]);
        for (category, facts) in table.iter() {
            assert!(facts.iter().all(|f| f.category == category));
        }
    }

    #[test]
    fn test_from_text_drops_blank_lines() {
        let content = ExtractedContent::from_text("  Total Revenue: 10 \n\n   \nNet Profit: 2\n");
        assert_eq!(content.lines, vec!["Total Revenue: 10", "Net Profit: 2"]);
        assert_eq!(content.status, TextStatus::Extracted);

        let empty = ExtractedContent::from_text("\n  \n");
        assert!(empty.lines.is_empty());
        assert_eq!(empty.status, TextStatus::NoTextExtracted);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(1200000.0).to_string(), "1200000");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Text(" Revenue ".into()).to_string(), "Revenue");
        assert!(CellValue::Text("  ".into()).is_empty());
    }
}
