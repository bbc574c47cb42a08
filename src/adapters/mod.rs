//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Language oracle clients (OpenAI, scripted mock)
//! - `http` - REST API over axum
//! - `postgres` - PostgreSQL session store and workflow source
//! - `storage` - In-memory session store and workflow source

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;
