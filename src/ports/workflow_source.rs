//! Workflow source port.
//!
//! Durable home of the workflow library. Read once at startup to build the
//! in-process catalogue.

use crate::domain::foundation::DomainError;
use crate::domain::workflow::Workflow;
use async_trait::async_trait;

/// Source of workflow definitions.
#[async_trait]
pub trait WorkflowSource: Send + Sync {
    /// Load every stored workflow, in seed order.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if a stored definition no longer validates
    /// - `DatabaseError` on persistence failure
    async fn load_all(&self) -> Result<Vec<Workflow>, DomainError>;

    /// Store workflows, replacing definitions with the same id.
    async fn seed(&self, workflows: &[Workflow]) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_source_is_object_safe() {
        fn _accepts_dyn(_source: &dyn WorkflowSource) {}
    }
}
