/// Database layer errors
///
/// Every fallible operation in [`crate::db`] returns [`DbError`]. The variants
/// split into two groups:
///
/// - Fatal at startup: [`DbError::Configuration`], [`DbError::SchemaNotInitialized`]
/// - Recoverable per unit of work: [`DbError::PoolExhausted`],
///   [`DbError::ConnectionUnavailable`], [`DbError::Query`]
///
/// Nothing in this layer retries. A failed acquisition or statement is
/// reported to the caller as soon as it happens.

use thiserror::Error;

/// Result alias for the database layer
pub type DbResult<T> = Result<T, DbError>;

/// Database layer error
#[derive(Error, Debug)]
pub enum DbError {
    /// Missing or invalid connection parameters
    #[error("Invalid database configuration: {0}")]
    Configuration(String),

    /// The table the service depends on does not exist
    #[error("Table '{table}' not found. Run the schema and seed scripts first.")]
    SchemaNotInitialized { table: String },

    /// Every connection stayed checked out for the whole acquire timeout
    #[error("Connection pool exhausted: all {max_connections} connections busy for {timeout_seconds}s")]
    PoolExhausted {
        max_connections: u32,
        timeout_seconds: u64,
    },

    /// The pool could not open or hand out a connection
    #[error("Database connection unavailable: {0}")]
    ConnectionUnavailable(String),

    /// A statement failed on an acquired connection
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl DbError {
    /// Whether the error happened before any work ran on a connection
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            DbError::PoolExhausted { .. } | DbError::ConnectionUnavailable(_)
        )
    }

    /// Whether the error must abort service startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DbError::Configuration(_) | DbError::SchemaNotInitialized { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::SchemaNotInitialized {
            table: "customers".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Table 'customers' not found. Run the schema and seed scripts first."
        );

        let err = DbError::PoolExhausted {
            max_connections: 10,
            timeout_seconds: 30,
        };
        assert_eq!(
            err.to_string(),
            "Connection pool exhausted: all 10 connections busy for 30s"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(DbError::ConnectionUnavailable("refused".into()).is_acquisition_failure());
        assert!(!DbError::ConnectionUnavailable("refused".into()).is_fatal());
        assert!(DbError::Configuration("bad port".into()).is_fatal());
        assert!(DbError::SchemaNotInitialized { table: "t".into() }.is_fatal());

        let query = DbError::from(sqlx::Error::RowNotFound);
        assert!(!query.is_acquisition_failure());
        assert!(!query.is_fatal());
    }
}
