//! AbandonSessionHandler - Command handler for closing an unfinished session.

use std::sync::Arc;

use tracing::info;

use crate::application::SessionLocks;
use crate::domain::dialogue;
use crate::domain::foundation::{ErrorCode, SessionId, Timestamp};
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionStore;

/// Command to abandon a session.
#[derive(Debug, Clone)]
pub struct AbandonSessionCommand {
    pub session_id: SessionId,
}

/// Result of a successful abandon.
#[derive(Debug, Clone)]
pub struct AbandonSessionResult {
    pub session: Session,
    /// False if the session had already been abandoned.
    pub changed: bool,
}

/// Handler for abandoning sessions.
///
/// Takes the same per-session lock as message processing, so an abandon
/// never interleaves with a message for the same session.
pub struct AbandonSessionHandler {
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
}

impl AbandonSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>, locks: SessionLocks) -> Self {
        Self { store, locks }
    }

    pub async fn handle(
        &self,
        cmd: AbandonSessionCommand,
    ) -> Result<AbandonSessionResult, SessionError> {
        let _guard = self.locks.acquire(cmd.session_id).await;

        let mut session = self
            .store
            .load(&cmd.session_id)
            .await?
            .ok_or_else(|| SessionError::not_found(cmd.session_id))?;

        let changed = match session.abandon(Timestamp::now()) {
            Ok(changed) => changed,
            Err(err) if err.code == ErrorCode::SessionClosed => {
                let status = session.status();
                return Err(SessionError::closed(
                    status,
                    dialogue::closing_message(status).unwrap_or_default(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        if changed {
            self.store.save(&session).await?;
            info!(session_id = %cmd.session_id, "Session abandoned");
        }

        Ok(AbandonSessionResult { session, changed })
    }
}
