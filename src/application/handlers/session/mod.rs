//! Session command and query handlers.

mod abandon_session;
mod create_session;
mod get_session;
mod process_message;

pub use abandon_session::{AbandonSessionCommand, AbandonSessionHandler, AbandonSessionResult};
pub use create_session::{CreateSessionHandler, CreateSessionResult};
pub use get_session::{GetSessionHandler, GetSessionQuery, SessionView};
pub use process_message::{
    AgentReply, ProcessMessageCommand, ProcessMessageHandler, DEFAULT_MAX_MESSAGE_CHARS,
};
