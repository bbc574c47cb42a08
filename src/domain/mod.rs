//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `workflow` - Diagnostic decision trees, their catalogue and the built-in library
//! - `session` - Troubleshooting session aggregate and lifecycle
//! - `matching` - Problem description to workflow matching
//! - `interpretation` - Reply to branch interpretation
//! - `dialogue` - Agent reply texts
//! - `text` - Normalization shared by matching and interpretation

pub mod consultation;
pub mod dialogue;
pub mod foundation;
pub mod interpretation;
pub mod matching;
pub mod session;
pub mod text;
pub mod workflow;
