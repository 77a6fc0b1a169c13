//! Session context
//!
//! Holds the current document, its fact table and the conversation
//! history for one user. A new upload replaces the document only when it
//! loads successfully.

use crate::error::QaError;
use crate::extractor::FactExtractor;
use crate::loader::DocumentLoader;
use crate::matcher::QuestionMatcher;
use crate::memory::{ConversationHistory, QaExchange};
use crate::models::{
    Answer, DocumentInfo, ExtractedContent, FactTable, MetricCategory, TextStatus,
};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

/// A parsed document and the facts extracted from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedDocument {
    pub info: DocumentInfo,
    pub content: ExtractedContent,
    pub facts: FactTable,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedDocument {
    /// Load and extract in one step; blocking, CPU bound
    pub fn process(
        loader: &DocumentLoader,
        extractor: &FactExtractor,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Self> {
        let (info, content) = loader.load(file_name, bytes)?;
        let facts = extractor.extract(&content);

        Ok(Self {
            info,
            content,
            facts,
            loaded_at: Utc::now(),
        })
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            document: self.info.clone(),
            status: self.content.status,
            line_count: self.content.lines.len(),
            row_count: self.content.row_count(),
            fact_count: self.facts.len(),
            facts_by_category: self.facts.counts(),
            anomalies: self.content.anomalies.clone(),
            facts: self.facts.clone(),
        }
    }
}

/// What an upload produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    pub document: DocumentInfo,
    pub status: TextStatus,
    pub line_count: usize,
    pub row_count: usize,
    pub fact_count: usize,
    pub facts_by_category: BTreeMap<MetricCategory, usize>,
    pub anomalies: Vec<String>,
    pub facts: FactTable,
}

impl IngestSummary {
    /// Human-readable status line for the upload
    pub fn message(&self) -> String {
        match (self.status, self.fact_count) {
            (TextStatus::NoTextExtracted, _) => format!(
                "{} was read but no text could be extracted (it may be a scanned image).",
                self.document.file_name
            ),
            (TextStatus::Extracted, 0) => format!(
                "{} processed, but no financial figures were recognised.",
                self.document.file_name
            ),
            (TextStatus::Extracted, n) => format!(
                "{} processed successfully: {} financial figure{} extracted.",
                self.document.file_name,
                n,
                if n == 1 { "" } else { "s" }
            ),
        }
    }
}

/// Raw text and full fact table for diagnosis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugReport {
    pub document: DocumentInfo,
    pub status: TextStatus,
    pub text_preview: String,
    pub truncated: bool,
    pub line_count: usize,
    pub sheet_names: Vec<String>,
    pub anomalies: Vec<String>,
    pub facts: FactTable,
}

impl DebugReport {
    pub fn build(document: &LoadedDocument, preview_chars: usize) -> Self {
        let text = document.content.text();
        let truncated = text.chars().count() > preview_chars;
        let mut text_preview: String = text.chars().take(preview_chars).collect();
        if truncated {
            text_preview.push_str("...");
        }

        let sheet_names = document
            .content
            .sheets
            .as_ref()
            .map(|sheets| sheets.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default();

        Self {
            document: document.info.clone(),
            status: document.content.status,
            text_preview,
            truncated,
            line_count: document.content.lines.len(),
            sheet_names,
            anomalies: document.content.anomalies.clone(),
            facts: document.facts.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
    document: Option<LoadedDocument>,
    history: ConversationHistory,
}

impl Session {
    pub fn new(history_limit: usize) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            created_at: now,
            last_active: now,
            document: None,
            history: ConversationHistory::new(history_limit),
        }
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn facts(&self) -> Option<&FactTable> {
        self.document.as_ref().map(|d| &d.facts)
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Time of the last upload or question
    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Replace the current document; the history is kept
    pub fn install(&mut self, document: LoadedDocument) -> IngestSummary {
        let summary = document.summary();
        info!(
            session_id = %self.session_id,
            file = %document.info.file_name,
            facts = summary.fact_count,
            "Document installed"
        );
        self.document = Some(document);
        self.last_active = Utc::now();
        summary
    }

    /// Load, extract and install. On failure the previous document stays.
    pub fn ingest(
        &mut self,
        loader: &DocumentLoader,
        extractor: &FactExtractor,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<IngestSummary> {
        let document = LoadedDocument::process(loader, extractor, file_name, bytes)?;
        Ok(self.install(document))
    }

    /// Answer against the current fact table and record the exchange
    pub fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::InvalidRequest("question is empty".to_string()));
        }

        let facts = self.facts().ok_or(QaError::NoDocument)?;
        let answer = QuestionMatcher::answer(question, facts);
        self.last_active = Utc::now();

        self.history
            .record(QaExchange::new(question.to_string(), answer.clone()));
        Ok(answer)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn debug_report(&self, preview_chars: usize) -> Result<DebugReport> {
        let document = self.document.as_ref().ok_or(QaError::NoDocument)?;
        Ok(DebugReport::build(document, preview_chars))
    }
}
