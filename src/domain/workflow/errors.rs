//! Workflow-specific error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, StepId, WorkflowId};

/// Errors raised while building or looking up workflows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Workflow '{0}' not found")]
    NotFound(WorkflowId),

    #[error("Workflow '{workflow_id}' is defined more than once")]
    Duplicate { workflow_id: WorkflowId },

    #[error("Workflow '{workflow_id}' defines step '{step_id}' more than once")]
    DuplicateStep {
        workflow_id: WorkflowId,
        step_id: StepId,
    },

    #[error("Workflow '{workflow_id}' references unknown step '{step_id}'")]
    UnknownStep {
        workflow_id: WorkflowId,
        step_id: StepId,
    },

    #[error("Step '{step_id}' of workflow '{workflow_id}' links to unknown workflow '{target}'")]
    UnknownLink {
        workflow_id: WorkflowId,
        step_id: StepId,
        target: WorkflowId,
    },

    #[error("Workflow '{workflow_id}' is invalid: {reason}")]
    Invalid {
        workflow_id: WorkflowId,
        reason: String,
    },

    #[error("Failed to parse workflow definition '{source_name}': {reason}")]
    Parse { source_name: String, reason: String },
}

impl WorkflowError {
    /// Creates a structural validation error.
    pub fn invalid(workflow_id: &WorkflowId, reason: impl Into<String>) -> Self {
        WorkflowError::Invalid {
            workflow_id: workflow_id.clone(),
            reason: reason.into(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            WorkflowError::NotFound(_) => ErrorCode::WorkflowNotFound,
            WorkflowError::UnknownStep { .. } => ErrorCode::StepNotFound,
            _ => ErrorCode::ValidationFailed,
        }
    }
}

impl From<WorkflowError> for DomainError {
    fn from(err: WorkflowError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_workflow_not_found() {
        let err = WorkflowError::NotFound(WorkflowId::new("gone").unwrap());
        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::WorkflowNotFound);
        assert!(domain.message.contains("gone"));
    }

    #[test]
    fn invalid_maps_to_validation_failed() {
        let err = WorkflowError::invalid(&WorkflowId::new("w").unwrap(), "no steps");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.to_string(), "Workflow 'w' is invalid: no steps");
    }
}
