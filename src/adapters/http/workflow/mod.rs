//! HTTP adapter for the workflow catalogue.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::application::{ListWorkflowsHandler, WorkflowSummary};

/// Catalogue entry as returned by `GET /api/workflows`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub step_count: usize,
}

impl From<WorkflowSummary> for WorkflowResponse {
    fn from(summary: WorkflowSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            title: summary.title,
            summary: summary.summary,
            step_count: summary.step_count,
        }
    }
}

/// GET /api/workflows - List available troubleshooting guides
pub async fn list_workflows(
    State(handler): State<Arc<ListWorkflowsHandler>>,
) -> Json<Vec<WorkflowResponse>> {
    Json(handler.handle().into_iter().map(Into::into).collect())
}

/// Creates the workflow router.
pub fn workflow_routes(handler: Arc<ListWorkflowsHandler>) -> Router {
    Router::new()
        .route("/", get(list_workflows))
        .with_state(handler)
}
