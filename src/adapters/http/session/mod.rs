//! HTTP adapter for session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AbandonSessionResponse, CreateSessionResponse, ErrorResponse, MessageResponse,
    SendMessageRequest, SessionResponse, TurnResponse,
};
pub use handlers::SessionHandlers;
pub use routes::session_routes;
