/// Integration tests for the Mini Backend API
///
/// These tests drive the full router end to end:
/// - Health reporting with and without a database
/// - Validation and malformed input rejected before any connection is used
/// - Pool failures surfacing as 503
/// - Customer create/get/list against a live database
///
/// Tests marked "live" skip themselves unless `DB_HOST` points at a database
/// whose `customers` table exists.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use minibackend_shared::db::DatabaseConfig;
use serde_json::json;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Email address unique to this test run
fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}@example.com", prefix, nanos)
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let ctx = TestContext::unreachable();

    let (status, body) = ctx.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(ctx.db.stats().checked_out, 0);
}

#[tokio::test]
async fn test_list_customers_without_database_is_unavailable() {
    let ctx = TestContext::unreachable();

    let (status, body) = ctx.get("/customers").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");
    assert_eq!(ctx.db.stats().checked_out, 0);
}

#[tokio::test]
async fn test_invalid_customer_is_rejected_before_acquiring() {
    let ctx = TestContext::unreachable();

    let (status, body) = ctx
        .post_json(
            "/customers",
            json!({
                "name": "",
                "email": "not-an-email"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name"]);

    // Validation failed, so the pool was never touched
    assert!(!ctx.db.is_initialized());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::unreachable();

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/customers")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = ctx.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(!ctx.db.is_initialized());
}

#[tokio::test]
async fn test_missing_field_is_unprocessable() {
    let ctx = TestContext::unreachable();

    let (status, body) = ctx.post_json("/customers", json!({ "name": "Ada" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");
    assert!(!ctx.db.is_initialized());
}

#[tokio::test]
async fn test_wrong_field_type_is_unprocessable() {
    let ctx = TestContext::unreachable();

    let (status, body) = ctx
        .post_json("/customers", json!({ "name": 5, "email": "a@b.co" }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "name");
    assert!(!ctx.db.is_initialized());
}

#[tokio::test]
async fn test_invalid_customer_id_is_unprocessable() {
    let ctx = TestContext::unreachable();

    for uri in ["/customers/abc", "/customers/99999999999"] {
        let (status, body) = ctx.get(uri).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "GET {}", uri);
        assert_eq!(body["error"], "validation_error", "GET {}", uri);
        assert!(body["details"][0]["message"].is_string(), "GET {}", uri);
    }
    assert!(!ctx.db.is_initialized());
}

#[tokio::test]
async fn test_health_probe_is_bounded() {
    // Acquisition alone would wait the full 30 seconds
    let ctx = TestContext::with_database(DatabaseConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        min_connections: 0,
        acquire_timeout_seconds: 30,
        ..Default::default()
    });

    let (status, body) = tokio::time::timeout(Duration::from_secs(10), ctx.get("/health"))
        .await
        .expect("Health check should not wait for the acquire timeout");

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "disconnected");
    assert_eq!(ctx.db.stats().checked_out, 0);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let ctx = TestContext::unreachable();

    let (status, _) = ctx.get("/orders").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_live_health_reports_connected() {
    let Some(ctx) = TestContext::live().await else { return };

    let (status, body) = ctx.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");

    ctx.db.close().await;
}

#[tokio::test]
async fn test_live_create_get_and_list_customer() {
    let Some(ctx) = TestContext::live().await else { return };
    let email = unique_email("alice");

    let (status, created) = ctx
        .post_json(
            "/customers",
            json!({
                "name": "Alice Smith",
                "email": email,
                "phone": "555-0100"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", created);
    assert_eq!(created["name"], "Alice Smith");
    assert_eq!(created["email"], email.as_str());
    assert!(created["address"].is_null());
    assert!(created["created_at"].is_string());

    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = ctx.get(&format!("/customers/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, listed) = ctx.get("/customers").await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .any(|customer| customer["id"].as_i64() == Some(id)));

    assert_eq!(ctx.db.stats().checked_out, 0);
    ctx.db.close().await;
}

#[tokio::test]
async fn test_live_missing_customer_is_not_found() {
    let Some(ctx) = TestContext::live().await else { return };

    let (status, body) = ctx.get("/customers/2147483647").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Customer not found");

    ctx.db.close().await;
}

#[tokio::test]
async fn test_live_duplicate_email_is_conflict() {
    let Some(ctx) = TestContext::live().await else { return };
    let email = unique_email("dup");
    let payload = json!({ "name": "Dup", "email": email });

    let (status, _) = ctx.post_json("/customers", payload.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.post_json("/customers", payload).await;
    if status == StatusCode::OK {
        eprintln!("skipping: customers.email carries no unique constraint");
        ctx.db.close().await;
        return;
    }
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    assert_eq!(ctx.db.stats().checked_out, 0);
    ctx.db.close().await;
}
