//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod session;
pub mod workflow;

pub use session::{
    AbandonSessionCommand, AbandonSessionHandler, AbandonSessionResult, AgentReply,
    CreateSessionHandler, CreateSessionResult, GetSessionHandler, GetSessionQuery,
    ProcessMessageCommand, ProcessMessageHandler, SessionView, DEFAULT_MAX_MESSAGE_CHARS,
};
pub use workflow::{ListWorkflowsHandler, WorkflowSummary};
