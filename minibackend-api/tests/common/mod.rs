/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Router construction over a real or an unreachable database
/// - Request helpers that return status and JSON body

use axum::body::Body;
use axum::http::{Request, StatusCode};
use minibackend_api::app::{build_router, AppState};
use minibackend_api::config::{ApiConfig, Config};
use minibackend_shared::db::{Database, DatabaseConfig, DbError};
use tower::ServiceExt;

/// Test context containing the router and its database handle
pub struct TestContext {
    pub db: Database,
    pub app: axum::Router,
}

impl TestContext {
    /// Builds a context over the given database configuration
    pub fn with_database(database: DatabaseConfig) -> Self {
        let config = Config {
            api: ApiConfig::default(),
            database,
        };
        let db = Database::new(config.database.clone());
        let app = build_router(AppState::new(db.clone(), config));

        TestContext { db, app }
    }

    /// Context whose database refuses every connection
    pub fn unreachable() -> Self {
        Self::with_database(DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            min_connections: 0,
            max_connections: 2,
            acquire_timeout_seconds: 1,
            ..Default::default()
        })
    }

    /// Context over the database named by `DB_*`, or `None` when it is not
    /// configured or the `customers` table is missing
    pub async fn live() -> Option<Self> {
        if std::env::var("DB_HOST").is_err() {
            eprintln!("skipping: DB_HOST is not set");
            return None;
        }

        let database = DatabaseConfig::from_env().expect("Invalid DB_* environment");
        let ctx = Self::with_database(database);

        match ctx.db.verify_schema_ready().await {
            Ok(()) => Some(ctx),
            Err(DbError::SchemaNotInitialized { table }) => {
                eprintln!("skipping: table '{}' does not exist", table);
                None
            }
            Err(err) => panic!("Database not reachable: {}", err),
        }
    }

    /// Sends a request and returns the status and parsed JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body)
                .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&body).into()))
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}
