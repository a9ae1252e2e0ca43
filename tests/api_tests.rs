mod common;

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tower::ServiceExt;

use ledger_api::api::router::create_router;
use ledger_api::config::AppConfig;
use ledger_api::AppState;

// The Prometheus recorder is process-global; install it once for the whole
// test binary.
static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS
        .get_or_init(ledger_api::metrics::init_metrics)
        .clone()
}

async fn build_test_app() -> Option<axum::Router> {
    let db = common::setup_test_db().await?;

    let config = AppConfig {
        database_url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
        host: "127.0.0.1".into(),
        port: 0,
        read_pool_size: 2,
        write_pool_size: 2,
        warmup_enabled: false,
    };

    let state = AppState {
        db: Arc::new(db),
        config,
        metrics_handle: metrics_handle(),
    };
    Some(create_router(state))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_pool_snapshot() {
    let _gate = common::db_lock().await;
    let Some(app) = build_test_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["pools"]["read"]["capacity"], 2);
    assert_eq!(json["pools"]["debit"]["available"], 2);
}

#[tokio::test]
async fn test_transaction_then_statement() {
    let _gate = common::db_lock().await;
    let Some(app) = build_test_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let resp = app
        .clone()
        .oneshot(post_json(
            "/accounts/1/transactions",
            json!({ "amount": 100, "kind": "credit", "description": "deposit" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let receipt = body_json(resp).await;
    assert_eq!(receipt["balance"], 100);
    assert_eq!(receipt["limit"], 100000);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/accounts/1/statement")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let statement = body_json(resp).await;
    assert_eq!(statement["balance"]["total"], 100);
    assert_eq!(statement["transactions"][0]["kind"], "credit");
    assert_eq!(statement["transactions"][0]["description"], "deposit");
}

#[tokio::test]
async fn test_invalid_requests_are_unprocessable() {
    let _gate = common::db_lock().await;
    let Some(app) = build_test_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let resp = app
        .clone()
        .oneshot(post_json(
            "/accounts/1/transactions",
            json!({ "amount": 0, "kind": "credit", "description": "x" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .oneshot(post_json(
            "/accounts/1/transactions",
            json!({ "amount": 10, "kind": "debit", "description": "way too long" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_insufficient_funds_is_unprocessable() {
    let _gate = common::db_lock().await;
    let Some(app) = build_test_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let resp = app
        .oneshot(post_json(
            "/accounts/2/transactions",
            json!({ "amount": 1000000, "kind": "debit", "description": "overdraft" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let _gate = common::db_lock().await;
    let Some(app) = build_test_app().await else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return;
    };

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/accounts/999/statement")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(post_json(
            "/accounts/999/transactions",
            json!({ "amount": 10, "kind": "credit", "description": "ghost" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
