//! GetSessionHandler - Query handler for resuming a session.

use std::sync::Arc;

use crate::domain::foundation::{SessionId, StepId, Timestamp, WorkflowId};
use crate::domain::session::{HelperFrame, SessionError, SessionStatus, Turn};
use crate::domain::workflow::WorkflowCatalogue;
use crate::ports::SessionStore;

/// Query to get a session by ID.
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: SessionId,
}

/// Read model of a session, enough for a client to resume the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub id: SessionId,
    pub status: SessionStatus,
    pub terminal: bool,
    pub workflow_id: Option<WorkflowId>,
    /// Title of the matched workflow, if it is still in the catalogue.
    pub workflow_title: Option<String>,
    pub current_step: Option<StepId>,
    /// Guide opened from the current step, if one is running.
    pub helper: Option<HelperFrame>,
    pub turns: Vec<Turn>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Handler for retrieving session details.
pub struct GetSessionHandler {
    store: Arc<dyn SessionStore>,
    catalogue: Arc<WorkflowCatalogue>,
}

impl GetSessionHandler {
    pub fn new(store: Arc<dyn SessionStore>, catalogue: Arc<WorkflowCatalogue>) -> Self {
        Self { store, catalogue }
    }

    pub async fn handle(&self, query: GetSessionQuery) -> Result<SessionView, SessionError> {
        let session = self
            .store
            .load(&query.session_id)
            .await?
            .ok_or_else(|| SessionError::not_found(query.session_id))?;

        let workflow_title = session
            .workflow_id()
            .and_then(|id| self.catalogue.find(id).ok())
            .map(|workflow| workflow.title().to_string());

        Ok(SessionView {
            id: *session.id(),
            status: session.status(),
            terminal: session.is_terminal(),
            workflow_id: session.workflow_id().cloned(),
            workflow_title,
            current_step: session.current_step().cloned(),
            helper: session.helper().cloned(),
            turns: session.turns().to_vec(),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        })
    }
}
