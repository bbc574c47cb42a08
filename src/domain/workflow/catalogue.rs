//! The in-process collection of workflows available to sessions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::foundation::WorkflowId;

use super::{Workflow, WorkflowError};

/// Read-only, ordered catalogue of validated workflows.
///
/// Insertion order is significant: the intent matcher breaks score ties
/// in favour of the workflow that was added first.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCatalogue {
    workflows: Vec<Arc<Workflow>>,
    index: HashMap<WorkflowId, usize>,
}

impl WorkflowCatalogue {
    /// Builds a catalogue, rejecting duplicate workflow ids and links to
    /// workflows that are not part of it.
    pub fn new(workflows: impl IntoIterator<Item = Workflow>) -> Result<Self, WorkflowError> {
        let mut catalogue = Self::default();
        for workflow in workflows {
            if catalogue.index.contains_key(workflow.id()) {
                return Err(WorkflowError::Duplicate {
                    workflow_id: workflow.id().clone(),
                });
            }
            catalogue
                .index
                .insert(workflow.id().clone(), catalogue.workflows.len());
            catalogue.workflows.push(Arc::new(workflow));
        }
        catalogue.check_links()?;
        Ok(catalogue)
    }

    fn check_links(&self) -> Result<(), WorkflowError> {
        for workflow in &self.workflows {
            for (step, link) in workflow.links() {
                if !self.index.contains_key(&link.workflow) {
                    return Err(WorkflowError::UnknownLink {
                        workflow_id: workflow.id().clone(),
                        step_id: step.id.clone(),
                        target: link.workflow.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Finds a workflow by id.
    pub fn find(&self, id: &WorkflowId) -> Result<&Arc<Workflow>, WorkflowError> {
        self.index
            .get(id)
            .map(|&position| &self.workflows[position])
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))
    }

    /// All workflows in insertion order.
    pub fn all(&self) -> &[Arc<Workflow>] {
        &self.workflows
    }

    /// Workflow titles in insertion order.
    pub fn titles(&self) -> Vec<&str> {
        self.workflows.iter().map(|w| w.title()).collect()
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}
