use std::sync::Arc;

use axum::Router;
use replydesk_agent::{LlmError, PlaybookRuntime};
use replydesk_core::config::{AppConfig, ConfigError, LoadOptions};
use replydesk_db::{connect_with_settings, migrations, DbPool, SessionService, SqlSessionStore};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{api, health};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<PlaybookRuntime>,
    pub sessions: SessionService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm client setup failed: {0}")]
    Llm(#[from] LlmError),
}

impl Application {
    pub fn router(&self) -> Router {
        api::router(api::ApiState::new(self.runtime.clone(), self.sessions.clone()))
            .merge(health::router(self.db_pool.clone(), self.runtime.ai_configured()))
            .layer(TraceLayer::new_for_http())
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let runtime = PlaybookRuntime::from_config(&config.llm)?;
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        ai_configured = runtime.ai_configured(),
        llm_provider = config.llm.provider.as_str(),
        "playbook runtime initialized"
    );

    let sessions = SessionService::new(Arc::new(SqlSessionStore::new(db_pool.clone())));

    Ok(Application { config, db_pool, runtime: Arc::new(runtime), sessions })
}
