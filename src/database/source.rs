use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};

/// Lookup of privileged rows (admin users, business owners) by the auth identity they belong to.
///
/// Rows come back as JSON so the caller can run them through a record adapter;
/// this keeps callers independent of the exact column layout of the backend.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// At most one row of `table` whose `auth_user_id` matches. More than one
    /// matching row violates the uniqueness of `auth_user_id` and is an error.
    async fn find_by_auth_user(
        &self,
        table: &str,
        auth_user_id: Uuid,
    ) -> Result<Option<Value>, DatabaseError>;
}

/// `RecordSource` backed by the hosted Postgres database
#[derive(Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn find_by_auth_user(
        &self,
        table: &str,
        auth_user_id: Uuid,
    ) -> Result<Option<Value>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM {} t WHERE t.auth_user_id = $1 LIMIT 2",
            DatabaseManager::table(table)?
        );

        let rows = sqlx::query(&sql)
            .bind(auth_user_id)
            .fetch_all(&self.pool)
            .await?;

        if rows.len() > 1 {
            return Err(DatabaseError::QueryError(format!(
                "multiple {} rows for auth user {}",
                table, auth_user_id
            )));
        }

        rows.first()
            .map(|row| row.try_get::<Value, _>("row"))
            .transpose()
            .map_err(DatabaseError::from)
    }
}
