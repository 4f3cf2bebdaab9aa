/// Database layer for the mini backend
///
/// This module provides the pooled PostgreSQL access layer.
///
/// # Modules
///
/// - `pool`: process-wide connection pool, configuration and statistics
/// - `scope`: scoped connection and transaction acquisition
/// - `schema`: startup check that the served table exists
/// - `error`: the [`DbError`] taxonomy
///
/// # Example
///
/// ```no_run
/// use minibackend_shared::db::{Database, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = Database::new(DatabaseConfig::from_env()?);
///     db.verify_schema_ready().await?;
///     db.close().await;
///     Ok(())
/// }
/// ```

pub mod error;
pub mod pool;
pub mod schema;
pub mod scope;

pub use error::{DbError, DbResult};
pub use pool::{get_pool, Database, DatabaseConfig, PoolStats};
pub use scope::ConnectionLease;
