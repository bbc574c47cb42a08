//! PostgreSQL implementation of SessionStore.
//!
//! The aggregate is persisted as a JSONB document alongside its status and
//! version. Updates are conditional on the stored version, so a stale copy
//! never overwrites a newer one.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::session::Session;
use crate::ports::SessionStore;

/// PostgreSQL implementation of SessionStore.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresSessionStore")
            .field("pool", &"PgPool")
            .finish()
    }
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, session: &Session) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (id, state, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(Json(session))
        .bind(session.status().as_str())
        .bind(to_db_version(session.version())?)
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert session: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn update(&self, session: &Session) -> Result<u64, DomainError> {
        let version = to_db_version(session.version())?;
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                state = $2,
                status = $3,
                version = $4,
                updated_at = $5
            WHERE id = $1 AND version = $6
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(Json(session))
        .bind(session.status().as_str())
        .bind(version)
        .bind(session.updated_at().as_datetime())
        .bind(version - 1)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update session: {}", e)))?;

        Ok(result.rows_affected())
    }
}

fn to_db_version(version: u64) -> Result<i64, DomainError> {
    i64::try_from(version)
        .map_err(|_| DomainError::database(format!("Session version out of range: {}", version)))
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row: Option<(Json<Session>,)> =
            sqlx::query_as("SELECT state FROM sessions WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to fetch session: {}", e)))?;

        Ok(row.map(|(Json(session),)| session))
    }

    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let written = if session.version() == 0 {
            self.insert(session).await?
        } else {
            self.update(session).await?
        };

        if written == 0 {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!("Session {} was modified concurrently", session.id()),
            )
            .with_detail("version", session.version().to_string()));
        }

        Ok(())
    }
}
