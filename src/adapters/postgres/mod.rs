//! PostgreSQL adapters - Database implementations of the storage ports.
//!
//! - `PostgresSessionStore` - Sessions as versioned JSONB documents
//! - `PostgresWorkflowSource` - Ordered workflow library

mod session_store;
mod workflow_source;

pub use session_store::PostgresSessionStore;
pub use workflow_source::PostgresWorkflowSource;
