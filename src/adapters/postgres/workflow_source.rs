//! PostgreSQL implementation of WorkflowSource.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::domain::workflow::Workflow;
use crate::ports::WorkflowSource;

/// Workflow library stored in the `workflows` table.
///
/// Definitions are validated again when loaded; a row that no longer
/// forms a valid workflow fails the whole load.
#[derive(Clone)]
pub struct PostgresWorkflowSource {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresWorkflowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresWorkflowSource")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl PostgresWorkflowSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowSource for PostgresWorkflowSource {
    async fn load_all(&self) -> Result<Vec<Workflow>, DomainError> {
        let rows: Vec<(Json<Workflow>,)> =
            sqlx::query_as("SELECT definition FROM workflows ORDER BY position, id")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to load workflows: {}", e)))?;

        Ok(rows.into_iter().map(|(Json(workflow),)| workflow).collect())
    }

    async fn seed(&self, workflows: &[Workflow]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        let (offset,): (i32,) = sqlx::query_as("SELECT COALESCE(MAX(position) + 1, 0) FROM workflows")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to read positions: {}", e)))?;

        for (index, workflow) in workflows.iter().enumerate() {
            let position = offset + index as i32;
            sqlx::query(
                r#"
                INSERT INTO workflows (id, title, position, definition)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE SET
                    title = EXCLUDED.title,
                    definition = EXCLUDED.definition,
                    updated_at = NOW()
                "#,
            )
            .bind(workflow.id().as_str())
            .bind(workflow.title())
            .bind(position)
            .bind(Json(workflow))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to seed workflow {}: {}", workflow.id(), e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit workflows: {}", e)))?;

        Ok(())
    }
}
