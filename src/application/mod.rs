//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (create, message, abandon) write through the session
//! store; query handlers (get, list) only read.

pub mod handlers;
mod session_locks;

pub use handlers::{
    AbandonSessionCommand, AbandonSessionHandler, AbandonSessionResult, AgentReply,
    CreateSessionHandler, CreateSessionResult, GetSessionHandler, GetSessionQuery,
    ListWorkflowsHandler, ProcessMessageCommand, ProcessMessageHandler, SessionView,
    WorkflowSummary, DEFAULT_MAX_MESSAGE_CHARS,
};
pub use session_locks::{SessionGuard, SessionLocks};
