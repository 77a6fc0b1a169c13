//! Financial Document Q&A
//!
//! Loads a PDF or spreadsheet, extracts labelled financial figures and
//! answers plain-language questions about them.
//!
//! PIPELINE:
//! FILE → LOAD (text / rows) → EXTRACT (fact table) → CLASSIFY QUESTION → ANSWER

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod matcher;
pub mod memory;
pub mod models;
pub mod session;
pub mod state;

pub use error::{QaError, Result};

// Re-export common types
pub use classifier::QuestionClassifier;
pub use config::{AppConfig, SheetMode};
pub use extractor::FactExtractor;
pub use loader::DocumentLoader;
pub use matcher::QuestionMatcher;
pub use models::*;
pub use session::{DebugReport, IngestSummary, LoadedDocument, Session};
