use chrono::Utc;
use sqlx::Row;

use super::{RepositoryError, SessionStore};
use crate::DbPool;

pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionStore for SqlSessionStore {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT payload FROM session_state WHERE session_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<String, _>("payload"))
            .transpose()
            .map_err(|error| RepositoryError::Decode(format!("session payload: {error}")))
    }

    async fn save(&self, key: &str, blob: String) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO session_state (session_key, payload, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(session_key) DO UPDATE SET
                 payload = excluded.payload,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&blob)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM session_state WHERE session_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
