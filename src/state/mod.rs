//! Session state layer
//!
//! Responsible for holding every live session.
//! In-memory only; nothing is written to disk.

use crate::error::QaError;
use crate::memory::QaExchange;
use crate::models::Answer;
use crate::session::{DebugReport, IngestSummary, LoadedDocument, Session};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Trait for session storage
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self) -> Result<Uuid>;
    async fn exists(&self, session_id: Uuid) -> bool;
    async fn install_document(
        &self,
        session_id: Uuid,
        document: LoadedDocument,
    ) -> Result<IngestSummary>;
    async fn ask(&self, session_id: Uuid, question: &str) -> Result<Answer>;
    async fn history(&self, session_id: Uuid) -> Result<Vec<QaExchange>>;
    async fn clear_history(&self, session_id: Uuid) -> Result<()>;
    async fn debug_report(&self, session_id: Uuid, preview_chars: usize) -> Result<DebugReport>;
    async fn remove(&self, session_id: Uuid) -> Result<()>;
}

/// In-memory session store; sessions never share state.
/// Holds at most `max_sessions`; the least recently active one makes room.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    history_limit: usize,
    max_sessions: usize,
}

impl InMemorySessionStore {
    pub fn new(history_limit: usize, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            history_limit,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(200, 1000)
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {

    async fn create(&self) -> Result<Uuid> {
        let session = Session::new(self.history_limit);
        let session_id = session.session_id;

        let mut sessions = self.sessions.write().await;
        while sessions.len() >= self.max_sessions {
            let Some(idle_id) = least_recently_active(&sessions) else {
                break;
            };
            sessions.remove(&idle_id);
            info!(session_id = %idle_id, "Session evicted at capacity");
        }
        sessions.insert(session_id, session);

        info!(session_id = %session_id, "Session created");
        Ok(session_id)
    }

    async fn exists(&self, session_id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    async fn install_document(
        &self,
        session_id: Uuid,
        document: LoadedDocument,
    ) -> Result<IngestSummary> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(QaError::SessionNotFound(session_id))?;

        Ok(session.install(document))
    }

    async fn ask(&self, session_id: Uuid, question: &str) -> Result<Answer> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(QaError::SessionNotFound(session_id))?;

        session.ask(question)
    }

    async fn history(&self, session_id: Uuid) -> Result<Vec<QaExchange>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or(QaError::SessionNotFound(session_id))?;

        Ok(session.history().exchanges().cloned().collect())
    }

    async fn clear_history(&self, session_id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(QaError::SessionNotFound(session_id))?;

        session.clear_history();
        Ok(())
    }

    async fn debug_report(&self, session_id: Uuid, preview_chars: usize) -> Result<DebugReport> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or(QaError::SessionNotFound(session_id))?;

        session.debug_report(preview_chars)
    }

    async fn remove(&self, session_id: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(&session_id) {
            Some(_) => {
                info!(session_id = %session_id, "Session removed");
                Ok(())
            }
            None => Err(QaError::SessionNotFound(session_id)),
        }
    }
}

fn least_recently_active(sessions: &HashMap<Uuid, Session>) -> Option<Uuid> {
    sessions
        .values()
        .min_by_key(|session| session.last_active())
        .map(|session| session.session_id)
}
