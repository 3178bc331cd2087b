pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod service;

pub use connection::{connect, connect_with_settings, ping, DbPool};
pub use repositories::{InMemorySessionStore, RepositoryError, SessionStore, SqlSessionStore};
pub use service::{ServiceError, SessionService};
