/// Health check endpoint
///
/// Provides a simple health check endpoint that verifies:
/// - The server is running
/// - A pooled database connection can be acquired and used
///
/// The endpoint always answers 200; a database outage is reported in the
/// body as `degraded` rather than as an error status. The database probe is
/// bounded by [`PROBE_TIMEOUT`] so an unreachable server cannot stall the
/// check for the full pool acquire timeout.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use minibackend_shared::db::DbError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on the database probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status: "ok" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status: "connected" or "disconnected"
    pub database: String,
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let probe = state.db.with_connection(|conn| {
        Box::pin(async move {
            sqlx::query("SELECT 1").execute(conn).await?;
            Ok::<_, DbError>(())
        })
    });

    let database_status = match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(())) => "connected",
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Health check could not reach the database");
            "disconnected"
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = PROBE_TIMEOUT.as_millis() as u64,
                "Health check timed out waiting for the database"
            );
            "disconnected"
        }
    };

    Json(HealthResponse {
        status: if database_status == "connected" {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
    })
}
