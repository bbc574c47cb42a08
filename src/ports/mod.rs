//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SessionStore` - Session persistence
//! - `WorkflowSource` - Workflow library persistence
//! - `LanguageOracle` - Optional LLM used as an interpretation fallback

mod language_oracle;
mod session_store;
mod workflow_source;

pub use language_oracle::{
    FinishReason, LanguageOracle, Message, MessageRole, OracleError, OracleInfo, OraclePurpose,
    OracleRequest, OracleResponse, TokenUsage,
};
pub use session_store::SessionStore;
pub use workflow_source::WorkflowSource;
