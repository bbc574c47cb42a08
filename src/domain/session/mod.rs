//! Session domain module.
//!
//! Handles the troubleshooting session lifecycle: creation, intent
//! matching, walking a workflow step by step, and closing with a
//! resolution, an escalation or abandonment.

mod aggregate;
mod errors;
mod status;
mod turn;

pub use aggregate::{HelperFrame, Session, Transition};
pub use errors::SessionError;
pub use status::SessionStatus;
pub use turn::{Turn, TurnRole};
