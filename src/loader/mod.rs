//! Document loader
//!
//! Turns an uploaded file into `ExtractedContent`: page text for PDFs,
//! sheet rows plus a flattened text view for spreadsheets.

pub mod pdf;
pub mod spreadsheet;

use crate::config::SheetMode;
use crate::error::QaError;
use crate::models::{DocumentFormat, DocumentInfo, ExtractedContent};
use crate::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info, warn};

/// Detect the document format from the file extension
pub fn detect_format(file_name: &str) -> Result<DocumentFormat> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("pdf") => Ok(DocumentFormat::Pdf),
        Some("xlsx") => Ok(DocumentFormat::Xlsx),
        Some("xls") => Ok(DocumentFormat::Xls),
        _ => Err(QaError::UnsupportedFormat(file_name.to_string())),
    }
}

/// SHA256 of the raw upload, hex encoded
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Loader configured once per process
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    sheet_mode: SheetMode,
}

impl DocumentLoader {
    pub fn new(sheet_mode: SheetMode) -> Self {
        Self { sheet_mode }
    }

    pub fn sheet_mode(&self) -> SheetMode {
        self.sheet_mode
    }

    /// Describe the upload without parsing it
    pub fn inspect(&self, file_name: &str, bytes: &[u8]) -> Result<DocumentInfo> {
        let format = detect_format(file_name)?;
        if bytes.is_empty() {
            return Err(QaError::EmptyDocument(file_name.to_string()));
        }

        Ok(DocumentInfo {
            file_name: file_name.to_string(),
            size_bytes: bytes.len(),
            format,
            sha256: fingerprint(bytes),
        })
    }

    /// Parse an upload into text lines and (for spreadsheets) rows
    pub fn load(&self, file_name: &str, bytes: &[u8]) -> Result<(DocumentInfo, ExtractedContent)> {
        let info = self.inspect(file_name, bytes)?;
        debug!(
            file = %info.file_name,
            format = ?info.format,
            size = info.size_bytes,
            "Loading document"
        );

        let content = match info.format {
            DocumentFormat::Pdf => pdf::extract(bytes)?,
            DocumentFormat::Xlsx | DocumentFormat::Xls => {
                spreadsheet::extract(bytes, info.format, self.sheet_mode)?
            }
        };

        for anomaly in &content.anomalies {
            warn!(file = %info.file_name, "{}", anomaly);
        }

        info!(
            file = %info.file_name,
            lines = content.lines.len(),
            rows = content.row_count(),
            status = ?content.status,
            "Document loaded"
        );

        Ok((info, content))
    }
}
