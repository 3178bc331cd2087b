use sqlx::migrate::{MigrateError, Migrator};
use sqlx::Row;

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// What the session schema looks like after migrations ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaReport {
    pub applied_migrations: usize,
    pub known_migrations: usize,
    /// `None` when the `session_state` table is missing.
    pub stored_sessions: Option<i64>,
}

impl SchemaReport {
    pub fn session_table_ready(&self) -> bool {
        self.stored_sessions.is_some()
    }
}

pub async fn inspect(pool: &DbPool) -> Result<SchemaReport, sqlx::Error> {
    let applied = sqlx::query("SELECT COUNT(*) AS count FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?
        .get::<i64, _>("count");
    let has_table = sqlx::query(
        "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = 'session_state'",
    )
    .fetch_one(pool)
    .await?
    .get::<i64, _>("count")
        > 0;

    let stored_sessions = if has_table {
        let count = sqlx::query("SELECT COUNT(*) AS count FROM session_state")
            .fetch_one(pool)
            .await?
            .get::<i64, _>("count");
        Some(count)
    } else {
        None
    };

    Ok(SchemaReport {
        applied_migrations: usize::try_from(applied).unwrap_or_default(),
        known_migrations: MIGRATOR.iter().count(),
        stored_sessions,
    })
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::{inspect, run_pending};
    use crate::repositories::{SessionStore, SqlSessionStore};
    use crate::{connect_with_settings, migrations::MIGRATOR};

    #[tokio::test]
    async fn migrations_create_session_table() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");

        let count = sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = 'session_state'",
        )
        .fetch_one(&pool)
        .await
        .expect("check session_state table")
        .get::<i64, _>("count");

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run");

        let applied = sqlx::query("SELECT COUNT(*) AS count FROM _sqlx_migrations")
            .fetch_one(&pool)
            .await
            .expect("count applied migrations")
            .get::<i64, _>("count");

        assert_eq!(applied as usize, MIGRATOR.iter().count());
    }

    #[tokio::test]
    async fn inspect_counts_stored_sessions() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        SqlSessionStore::new(pool.clone()).save("guest-1", "{}".to_string()).await.expect("save");

        let report = inspect(&pool).await.expect("inspect");

        assert!(report.session_table_ready());
        assert_eq!(report.stored_sessions, Some(1));
        assert_eq!(report.applied_migrations, report.known_migrations);
    }

    #[tokio::test]
    async fn inspect_reports_missing_session_table() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        sqlx::query("DROP TABLE session_state").execute(&pool).await.expect("drop table");

        let report = inspect(&pool).await.expect("inspect");

        assert!(!report.session_table_ready());
        assert_eq!(report.stored_sessions, None);
    }
}
