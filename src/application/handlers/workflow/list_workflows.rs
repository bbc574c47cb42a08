//! ListWorkflowsHandler - Query handler for the workflow catalogue.

use std::sync::Arc;

use crate::domain::foundation::WorkflowId;
use crate::domain::workflow::WorkflowCatalogue;

/// One catalogue entry as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub title: String,
    pub summary: Option<String>,
    pub step_count: usize,
}

/// Handler listing the loaded workflows in catalogue order.
pub struct ListWorkflowsHandler {
    catalogue: Arc<WorkflowCatalogue>,
}

impl ListWorkflowsHandler {
    pub fn new(catalogue: Arc<WorkflowCatalogue>) -> Self {
        Self { catalogue }
    }

    pub fn handle(&self) -> Vec<WorkflowSummary> {
        self.catalogue
            .all()
            .iter()
            .map(|workflow| WorkflowSummary {
                id: workflow.id().clone(),
                title: workflow.title().to_string(),
                summary: workflow.summary().map(str::to_string),
                step_count: workflow.step_count(),
            })
            .collect()
    }
}
