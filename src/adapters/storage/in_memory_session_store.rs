//! In-Memory Session Store Adapter
//!
//! Stores sessions in memory. Used when no database is configured and
//! throughout the test suite.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::session::Session;
use crate::ports::SessionStore;

/// In-memory storage for sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;

        let stored_version = sessions.get(session.id()).map(Session::version);
        let expected = match session.version() {
            0 => None,
            v => Some(v - 1),
        };
        if stored_version.is_some() && stored_version != expected {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!("Session {} was modified concurrently", session.id()),
            )
            .with_detail("stored_version", format!("{:?}", stored_version))
            .with_detail("version", session.version().to_string()));
        }

        sessions.insert(*session.id(), session.clone());
        Ok(())
    }
}
