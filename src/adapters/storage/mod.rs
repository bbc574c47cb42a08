//! Storage adapters for sessions and workflows.
//!
//! - `InMemorySessionStore` - Session store backed by a `HashMap`
//! - `InMemoryWorkflowSource` - Workflow library backed by a `Vec`

mod in_memory_session_store;
mod in_memory_workflow_source;

pub use in_memory_session_store::InMemorySessionStore;
pub use in_memory_workflow_source::InMemoryWorkflowSource;
