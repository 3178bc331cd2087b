use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod session;

pub use memory::InMemorySessionStore;
pub use session::SqlSessionStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Raw session blobs keyed by an opaque session key.
///
/// Stores do not interpret the payload; parsing and migration happen in
/// `SessionState::restore`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn save(&self, key: &str, blob: String) -> Result<(), RepositoryError>;
    async fn clear(&self, key: &str) -> Result<(), RepositoryError>;
}
