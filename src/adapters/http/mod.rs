//! HTTP adapters - REST API implementations.
//!
//! Each resource has its own HTTP adapter; [`build_router`] assembles them
//! under `/api` with the shared middleware stack.

pub mod router;
pub mod session;
pub mod workflow;

pub use router::{build_router, health, HttpState, RouterOptions};
pub use session::{session_routes, SessionHandlers};
pub use workflow::workflow_routes;
