//! Error types for the financial document Q&A assistant

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Error, Debug)]
pub enum QaError {

    // =============================
    // Document Loading Errors
    // =============================

    #[error("Unsupported format: {0} (expected .pdf, .xlsx or .xls)")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Empty document: {0} has zero bytes")]
    EmptyDocument(String),

    // =============================
    // Interaction Errors
    // =============================

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("No document loaded: upload a financial document before asking questions")]
    NoDocument,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl QaError {
    /// Loader failures reject the upload but leave the session usable
    pub fn is_document_rejection(&self) -> bool {
        matches!(
            self,
            QaError::UnsupportedFormat(_) | QaError::CorruptDocument(_) | QaError::EmptyDocument(_)
        )
    }
}
