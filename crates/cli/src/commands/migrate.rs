use crate::commands::CommandResult;
use replydesk_core::config::{AppConfig, DatabaseConfig, LoadOptions};
use replydesk_db::connect_with_settings;
use replydesk_db::migrations::{self, SchemaReport};

const COMMAND: &str = "migrate";

type Failure = (&'static str, String, u8);

/// Applies pending session-store migrations and reports on the `session_state` table.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| {
            ("runtime_init", format!("failed to initialize async runtime: {error}"), 3u8)
        })
        .and_then(|runtime| runtime.block_on(migrate_session_store(&config.database)));

    match outcome {
        Ok(report) => CommandResult::success(COMMAND, describe(&report, &config.database.url)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}

async fn migrate_session_store(database: &DatabaseConfig) -> Result<SchemaReport, Failure> {
    let pool =
        connect_with_settings(&database.url, database.max_connections, database.timeout_secs)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    let result = async {
        migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
        let report = migrations::inspect(&pool)
            .await
            .map_err(|error| ("schema", format!("could not inspect session schema: {error}"), 6u8))?;
        if !report.session_table_ready() {
            return Err((
                "schema",
                "migrations ran but the `session_state` table is missing".to_string(),
                6u8,
            ));
        }
        Ok::<_, Failure>(report)
    }
    .await;

    pool.close().await;
    result
}

fn describe(report: &SchemaReport, url: &str) -> String {
    format!(
        "session_state table ready at `{url}`: {} stored session(s), {}/{} migrations applied",
        report.stored_sessions.unwrap_or_default(),
        report.applied_migrations,
        report.known_migrations,
    )
}

#[cfg(test)]
mod tests {
    use replydesk_db::migrations::SchemaReport;

    use super::describe;

    #[test]
    fn describe_names_the_session_table_and_counts() {
        let report =
            SchemaReport { applied_migrations: 1, known_migrations: 1, stored_sessions: Some(4) };

        let message = describe(&report, "sqlite://replydesk.db");

        assert_eq!(
            message,
            "session_state table ready at `sqlite://replydesk.db`: 4 stored session(s), 1/1 migrations applied"
        );
    }
}
