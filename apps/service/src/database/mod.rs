/// Database abstraction layer
///
/// The scheduler only sees the [`Registry`] trait; [`LibsqlRegistry`] is the
/// SQLite-backed implementation shared with the management API.

pub mod error;
pub mod migrations;
pub mod models;
pub mod repository;

pub use error::{RegistryError, RegistryResult};
pub use models::{NewSink, NewTarget, Observation, Sink, Target};
pub use repository::{LibsqlRegistry, Registry};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
