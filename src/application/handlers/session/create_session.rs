//! CreateSessionHandler - Command handler for starting a troubleshooting session.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionStore;

/// Result of successful session creation.
#[derive(Debug, Clone)]
pub struct CreateSessionResult {
    pub session: Session,
}

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    store: Arc<dyn SessionStore>,
}

impl CreateSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self) -> Result<CreateSessionResult, SessionError> {
        let session = Session::new(SessionId::new(), Timestamp::now());
        self.store.save(&session).await?;

        info!(session_id = %session.id(), "Session created");
        Ok(CreateSessionResult { session })
    }
}
