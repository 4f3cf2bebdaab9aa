/// Scoped connection acquisition
///
/// A unit of work borrows one pooled connection for its whole duration and
/// gives it back when it ends, however it ends. Release is tied to the drop of
/// a [`ConnectionLease`], so it happens on success, on error, and when the
/// caller's future is dropped mid-flight.
///
/// ```text
/// IDLE → ACQUIRING → ACQUIRED → {SUCCESS | FAILED} → RELEASED → IDLE
/// ```
///
/// # Example
///
/// ```no_run
/// use minibackend_shared::db::{Database, DbError};
///
/// # async fn example(db: Database) -> Result<(), DbError> {
/// let count: i64 = db
///     .with_connection(|conn| {
///         Box::pin(async move {
///             let count = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
///                 .fetch_one(conn)
///                 .await?;
///             Ok::<_, DbError>(count)
///         })
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use crate::db::error::{DbError, DbResult};
use crate::db::pool::Database;
use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, PgConnection, Postgres};
use std::ops::{Deref, DerefMut};
use std::time::Instant;
use tracing::{debug, warn};

/// A pooled connection held by one unit of work
///
/// Dropping the lease returns the connection to the pool. The lease is not
/// `Clone`, so a connection has exactly one holder and is released once.
pub struct ConnectionLease {
    conn: PoolConnection<Postgres>,
    db: Database,
    acquired_at: Instant,
}

impl Deref for ConnectionLease {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        &self.conn
    }
}

impl DerefMut for ConnectionLease {
    fn deref_mut(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.db.lease_released();
        debug!(
            held_ms = self.acquired_at.elapsed().as_secs_f64() * 1000.0,
            "Database connection released"
        );
    }
}

impl Database {
    /// Checks out one connection
    ///
    /// Waits up to the configured acquire timeout. Dropping the returned future
    /// while it waits abandons the attempt without leaking a connection.
    ///
    /// # Errors
    ///
    /// - [`DbError::PoolExhausted`] if every connection stayed busy for the timeout
    /// - [`DbError::ConnectionUnavailable`] if no connection could be opened or the
    ///   pool is closed
    pub async fn acquire(&self) -> DbResult<ConnectionLease> {
        let pool = self.get_pool();

        let conn = pool
            .acquire()
            .await
            .map_err(|e| self.acquisition_error(e))?;

        self.lease_acquired();
        debug!("Database connection acquired");

        Ok(ConnectionLease {
            conn,
            db: self.clone(),
            acquired_at: Instant::now(),
        })
    }

    /// Runs `work` with a connection that is released when it finishes
    ///
    /// `work` is never invoked if acquisition fails. Whatever `work` returns,
    /// including its error, is passed through unchanged.
    pub async fn with_connection<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<DbError>,
    {
        let mut lease = self.acquire().await?;
        work(&mut *lease).await
    }

    /// Runs `work` inside a transaction on a scoped connection
    ///
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err` or
    /// is cancelled. The connection is released afterwards in every case.
    pub async fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<DbError>,
    {
        let mut lease = self.acquire().await?;
        let mut tx = lease.begin().await.map_err(DbError::from)?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(DbError::from)?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Transaction rollback failed");
                } else {
                    debug!("Transaction rolled back");
                }
                Err(err)
            }
        }
    }

    fn acquisition_error(&self, err: sqlx::Error) -> DbError {
        let config = self.config();

        let mapped = match err {
            // Only leases held through this handle prove saturation; pending
            // connect attempts also count toward the pool size
            sqlx::Error::PoolTimedOut
                if self.stats().checked_out >= config.max_connections as usize =>
            {
                DbError::PoolExhausted {
                    max_connections: config.max_connections,
                    timeout_seconds: config.acquire_timeout_seconds,
                }
            }
            sqlx::Error::PoolTimedOut => DbError::ConnectionUnavailable(format!(
                "could not open a connection to {}:{} within {}s",
                config.host, config.port, config.acquire_timeout_seconds
            )),
            sqlx::Error::PoolClosed => {
                DbError::ConnectionUnavailable("connection pool is closed".to_string())
            }
            other => DbError::ConnectionUnavailable(other.to_string()),
        };

        warn!(error = %mapped, "Database connection acquisition failed");
        mapped
    }
}
