/// Startup schema precondition check
///
/// The service does not create or migrate its schema. Before it accepts
/// traffic it confirms the table it serves exists and refuses to start
/// otherwise.
///
/// # Example
///
/// ```no_run
/// use minibackend_shared::db::{Database, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::new(DatabaseConfig::from_env()?);
/// db.verify_schema_ready().await?;
/// # Ok(())
/// # }
/// ```

use crate::db::error::{DbError, DbResult};
use crate::db::pool::Database;
use sqlx::PgConnection;
use tracing::{debug, error, info};

/// Schema searched for the required table
pub const REQUIRED_SCHEMA: &str = "public";

/// Checks whether `table` exists in the `public` schema
pub async fn table_exists(conn: &mut PgConnection, table: &str) -> DbResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = $1
            AND table_name = $2
        )",
    )
    .bind(REQUIRED_SCHEMA)
    .bind(table)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

impl Database {
    /// Fails unless the configured required table exists
    ///
    /// Holds one scoped connection for the duration of the check. Calling it
    /// again gives the same answer as long as the schema is unchanged.
    ///
    /// # Errors
    ///
    /// - [`DbError::SchemaNotInitialized`] if the table is absent
    /// - [`DbError::PoolExhausted`] / [`DbError::ConnectionUnavailable`] if no
    ///   connection could be acquired
    /// - [`DbError::Query`] if the catalog query itself fails
    pub async fn verify_schema_ready(&self) -> DbResult<()> {
        let table = self.config().required_table.clone();
        debug!(table = %table, "Verifying database schema");

        let lookup = table.clone();
        let exists = self
            .with_connection(move |conn| {
                Box::pin(async move { table_exists(conn, &lookup).await })
            })
            .await?;

        if exists {
            info!(table = %table, "Database schema ready");
            Ok(())
        } else {
            error!(table = %table, "Required table is missing");
            Err(DbError::SchemaNotInitialized { table })
        }
    }
}
