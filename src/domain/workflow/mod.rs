//! Workflow module - diagnostic decision trees and their catalogue.

mod builtin;
mod catalogue;
mod errors;
mod model;

pub use builtin::{builtin_workflows, parse_workflow_yaml};
pub use catalogue::WorkflowCatalogue;
pub use errors::WorkflowError;
pub use model::{
    Branch, BranchTarget, Outcome, Step, StepKind, Workflow, WorkflowDefinition, WorkflowLink,
};

#[cfg(test)]
pub(crate) use model::fixtures;
