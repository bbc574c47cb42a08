//! Workflow query handlers.

mod list_workflows;

pub use list_workflows::{ListWorkflowsHandler, WorkflowSummary};
