//! In-Memory Workflow Source Adapter

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::workflow::Workflow;
use crate::ports::WorkflowSource;

/// In-memory workflow library, kept in seed order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowSource {
    workflows: Arc<RwLock<Vec<Workflow>>>,
}

impl InMemoryWorkflowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source pre-populated with `workflows`.
    pub fn with_workflows(workflows: Vec<Workflow>) -> Self {
        Self {
            workflows: Arc::new(RwLock::new(workflows)),
        }
    }
}

#[async_trait]
impl WorkflowSource for InMemoryWorkflowSource {
    async fn load_all(&self) -> Result<Vec<Workflow>, DomainError> {
        Ok(self.workflows.read().await.clone())
    }

    async fn seed(&self, workflows: &[Workflow]) -> Result<(), DomainError> {
        let mut stored = self.workflows.write().await;
        for workflow in workflows {
            match stored.iter_mut().find(|w| w.id() == workflow.id()) {
                Some(existing) => *existing = workflow.clone(),
                None => stored.push(workflow.clone()),
            }
        }
        Ok(())
    }
}
