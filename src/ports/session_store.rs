//! Session store port.
//!
//! Defines the contract for persisting and retrieving Session aggregates.
//!
//! # Design
//!
//! - **Whole-aggregate writes**: `save` stores the complete session
//! - **Optimistic concurrency**: a session is saved on top of the version
//!   it was loaded at (`version - 1`), or inserted when its version is 0
//! - **Read-your-writes** per session id

use crate::domain::foundation::{DomainError, SessionId};
use crate::domain::session::Session;
use async_trait::async_trait;

/// Store port for Session aggregate persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Insert or update a session.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` if the stored version is not the one the
    ///   session was loaded at
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &Session) -> Result<(), DomainError>;
}
