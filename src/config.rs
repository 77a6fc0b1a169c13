//! Process configuration
//!
//! Read from the environment (after `.env` is loaded by the binaries).

use crate::error::QaError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Which sheets of a workbook are read
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SheetMode {
    #[default]
    All,
    First,
}

impl FromStr for SheetMode {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(SheetMode::All),
            "first" => Ok(SheetMode::First),
            other => Err(QaError::Config(format!(
                "unknown sheet mode '{}' (expected 'all' or 'first')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub sheet_mode: SheetMode,
    /// Characters of raw text shown in the debug report
    pub preview_chars: usize,
    /// Oldest exchanges are dropped beyond this many
    pub history_limit: usize,
    pub max_upload_bytes: usize,
    /// Least recently active sessions are evicted beyond this many
    pub max_sessions: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            sheet_mode: SheetMode::All,
            preview_chars: 1000,
            history_limit: 200,
            max_upload_bytes: 25 * 1024 * 1024,
            max_sessions: 1000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.port,
        };

        let sheet_mode = match lookup("QA_SHEET_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.sheet_mode,
        };

        let preview_chars = match lookup("QA_PREVIEW_CHARS") {
            Some(raw) => parse_value("QA_PREVIEW_CHARS", &raw)?,
            None => defaults.preview_chars,
        };

        let history_limit = match lookup("QA_HISTORY_LIMIT") {
            Some(raw) => parse_value("QA_HISTORY_LIMIT", &raw)?,
            None => defaults.history_limit,
        };

        let max_upload_bytes = match lookup("QA_MAX_UPLOAD_BYTES") {
            Some(raw) => parse_value("QA_MAX_UPLOAD_BYTES", &raw)?,
            None => defaults.max_upload_bytes,
        };

        let max_sessions = match lookup("QA_MAX_SESSIONS") {
            Some(raw) => parse_value("QA_MAX_SESSIONS", &raw)?,
            None => defaults.max_sessions,
        };

        Ok(Self {
            port,
            sheet_mode,
            preview_chars,
            history_limit,
            max_upload_bytes,
            max_sessions,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| QaError::Config(format!("{} has invalid value '{}'", key, raw)))
}
