/// Database connection pool management
///
/// This module owns the process-wide PostgreSQL connection pool. A [`Database`]
/// handle holds the pool configuration and builds the pool the first time a
/// connection is requested; every later request reuses the same pool.
///
/// # Example
///
/// ```no_run
/// use minibackend_shared::db::pool::{Database, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let db = Database::new(config);
///
///     // The pool is created here, on first use
///     let row: (i64,) = sqlx::query_as("SELECT $1")
///         .bind(42i64)
///         .fetch_one(db.get_pool())
///         .await?;
///
///     db.close().await;
///     Ok(())
/// }
/// ```

use crate::db::error::{DbError, DbResult};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

/// Table the service refuses to start without
pub const DEFAULT_REQUIRED_TABLE: &str = "customers";

/// Configuration for the database connection pool
///
/// Every field has a default so a local development database works without
/// any environment set up.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Server host (`DB_HOST`, default: localhost)
    pub host: String,

    /// Server port (`DB_PORT`, default: 5432)
    pub port: u16,

    /// Database name (`DB_NAME`, default: sqlcourse)
    pub database: String,

    /// Role to connect as (`DB_USER`, default: sqlcourse)
    pub username: String,

    /// Role password (`DB_PASSWORD`, default: sqlcourse)
    pub password: String,

    /// Connections kept open even when idle (`DB_MIN_CONNECTIONS`, default: 1)
    pub min_connections: u32,

    /// Upper bound on open connections (`DB_MAX_CONNECTIONS`, default: 10)
    pub max_connections: u32,

    /// How long an acquisition waits for a free connection (`DB_ACQUIRE_TIMEOUT_SECONDS`, default: 30)
    ///
    /// When every connection is checked out for this long the acquisition
    /// fails with [`DbError::PoolExhausted`].
    pub acquire_timeout_seconds: u64,

    /// Table checked by the startup schema check (`DB_REQUIRED_TABLE`, default: customers)
    pub required_table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "sqlcourse".to_string(),
            username: "sqlcourse".to_string(),
            password: "sqlcourse".to_string(),
            min_connections: 1,
            max_connections: 10,
            acquire_timeout_seconds: 30,
            required_table: DEFAULT_REQUIRED_TABLE.to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("min_connections", &self.min_connections)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_seconds", &self.acquire_timeout_seconds)
            .field("required_table", &self.required_table)
            .finish()
    }
}

impl DatabaseConfig {
    /// Loads the configuration from `DB_*` environment variables
    ///
    /// Unset variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Configuration`] if a numeric variable does not parse
    /// or the pool bounds are inconsistent.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("DB_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "DB_PORT", defaults.port)?,
            database: lookup("DB_NAME").unwrap_or(defaults.database),
            username: lookup("DB_USER").unwrap_or(defaults.username),
            password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
            min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections)?,
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            acquire_timeout_seconds: parse_var(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECONDS",
                defaults.acquire_timeout_seconds,
            )?,
            required_table: lookup("DB_REQUIRED_TABLE").unwrap_or(defaults.required_table),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks the values that cannot be caught by parsing alone
    pub fn validate(&self) -> DbResult<()> {
        if self.host.trim().is_empty() {
            return Err(DbError::Configuration("DB_HOST must not be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(DbError::Configuration("DB_NAME must not be empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(DbError::Configuration(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(DbError::Configuration(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.required_table.trim().is_empty() {
            return Err(DbError::Configuration(
                "DB_REQUIRED_TABLE must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection options for a single session
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .application_name("minibackend")
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> DbResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DbError::Configuration(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Handle to the application's connection pool
///
/// Cloning is cheap and every clone shares the same pool. Hand a clone to each
/// component that needs the database instead of reaching for a global.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    config: DatabaseConfig,
    pool: OnceLock<PgPool>,
    checked_out: AtomicUsize,
}

static GLOBAL: OnceLock<Database> = OnceLock::new();

impl Database {
    /// Creates a handle without opening any connection
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                config,
                pool: OnceLock::new(),
                checked_out: AtomicUsize::new(0),
            }),
        }
    }

    /// Process-wide handle configured from the environment
    ///
    /// The first successful call fixes the configuration for the rest of the
    /// process. Prefer passing an explicit [`Database`] around; this exists
    /// for code that has no way to receive one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Configuration`] if the environment is invalid.
    pub fn global() -> DbResult<&'static Database> {
        if let Some(db) = GLOBAL.get() {
            return Ok(db);
        }

        let config = DatabaseConfig::from_env()?;
        Ok(GLOBAL.get_or_init(|| Database::new(config)))
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Returns the pool, building it on the first call
    ///
    /// Concurrent first callers block on the same initialization, so exactly
    /// one pool is ever built per handle. Building does not connect; the first
    /// acquisition does. Must be called from within a tokio runtime.
    pub fn get_pool(&self) -> &PgPool {
        self.inner.pool.get_or_init(|| {
            let config = &self.inner.config;
            info!(
                host = %config.host,
                port = config.port,
                database = %config.database,
                min_connections = config.min_connections,
                max_connections = config.max_connections,
                acquire_timeout_seconds = config.acquire_timeout_seconds,
                "Creating database connection pool"
            );

            PgPoolOptions::new()
                .min_connections(config.min_connections)
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout())
                .connect_lazy_with(config.connect_options())
        })
    }

    /// Whether the pool has been built yet
    pub fn is_initialized(&self) -> bool {
        self.inner.pool.get().is_some()
    }

    /// Current pool statistics
    ///
    /// Reports zeros when the pool has not been built; never builds it.
    pub fn stats(&self) -> PoolStats {
        let checked_out = self.inner.checked_out.load(Ordering::SeqCst);

        match self.inner.pool.get() {
            Some(pool) => {
                let size = pool.size();
                let idle = pool.num_idle();

                PoolStats {
                    active_connections: (size as usize).saturating_sub(idle),
                    idle_connections: idle,
                    total_connections: size as usize,
                    checked_out,
                }
            }
            None => PoolStats {
                checked_out,
                ..PoolStats::default()
            },
        }
    }

    /// Gracefully closes the pool
    ///
    /// Waits for checked-out connections to come back, then closes every
    /// connection. Later acquisitions fail with
    /// [`DbError::ConnectionUnavailable`].
    pub async fn close(&self) {
        match self.inner.pool.get() {
            Some(pool) => {
                info!("Closing database connection pool");
                pool.close().await;
                info!("Database connection pool closed");
            }
            None => debug!("Database connection pool was never created, nothing to close"),
        }
    }

    pub(crate) fn lease_acquired(&self) {
        self.inner.checked_out.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn lease_released(&self) {
        self.inner.checked_out.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Returns the process-wide pool, building it on first use
///
/// # Errors
///
/// Returns [`DbError::Configuration`] if the environment is invalid.
pub fn get_pool() -> DbResult<&'static PgPool> {
    Ok(Database::global()?.get_pool())
}

/// Pool statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections open and not idle
    pub active_connections: usize,

    /// Connections open and waiting in the pool
    pub idle_connections: usize,

    /// Connections open in total
    pub total_connections: usize,

    /// Connections currently held by units of work through this handle
    pub checked_out: usize,
}
