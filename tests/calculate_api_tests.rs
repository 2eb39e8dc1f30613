//! Smoke tests for the HTTP API.
//!
//! Each route gets at least one test verifying:
//! - Valid requests return 2xx with the documented body shape.
//! - Validation failures map to client errors naming the offending field.
//!
//! Run with: `cargo test --test calculate_api_tests`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use splitstat::config::ServerConfig;
use splitstat::handlers::{build_router, ServiceState};
use splitstat::metrics;

// ═══════════════════════════════════════════════════════════════════════
// Test infrastructure
// ═══════════════════════════════════════════════════════════════════════

fn app() -> Router {
    // Registration is process-global; later calls are harmless.
    let _ = metrics::register_metrics();
    let state = Arc::new(ServiceState::new(ServerConfig::default()));
    build_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    let bytes = serde_json::to_vec(&body).unwrap();
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// /api/calculate
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn calculate_returns_the_full_aggregate() {
    let response = app()
        .oneshot(post_json(
            "/api/calculate",
            json!({
                "control_size": 1000,
                "control_conversions": 100,
                "variation_size": 1000,
                "variation_conversions": 150
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["control"]["sample_size"], 1000);
    assert!((body["control"]["conversion_rate"].as_f64().unwrap() - 0.10).abs() < 1e-12);
    assert!((body["variation"]["conversion_rate"].as_f64().unwrap() - 0.15).abs() < 1e-12);

    let tests = &body["statistical_tests"];
    for key in ["z_test", "chi_square", "fishers_exact", "barnards_exact", "g_test"] {
        assert!(tests.get(key).is_some(), "missing {key}");
        assert!(tests[key]["p_value"].is_number(), "{key} p_value undefined");
    }

    assert_eq!(body["results"]["is_significant"], true);
    assert_eq!(body["results"]["recommended_sample_size"], 0);
    assert_eq!(body["results"]["confidence_level"], 95.0);
}

#[tokio::test]
async fn calculate_reports_null_relative_difference_for_zero_control_rate() {
    let response = app()
        .oneshot(post_json(
            "/api/calculate",
            json!({
                "control_size": 1000,
                "control_conversions": 0,
                "variation_size": 1000,
                "variation_conversions": 0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert!(body["difference"]["relative"].is_null());
    assert_eq!(body["effect_size"]["cohens_h"], 0.0);
    assert_eq!(body["results"]["recommended_sample_size"], 0);
}

#[tokio::test]
async fn calculate_rejects_conversions_exceeding_sample_size() {
    let response = app()
        .oneshot(post_json(
            "/api/calculate",
            json!({
                "control_size": 100,
                "control_conversions": 150,
                "variation_size": 100,
                "variation_conversions": 10
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;

    assert_eq!(body["code"], "INVALID_INPUT");
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("control_conversions"), "got: {message}");
}

#[tokio::test]
async fn calculate_rejects_zero_sample_size() {
    let response = app()
        .oneshot(post_json(
            "/api/calculate",
            json!({
                "control_size": 0,
                "control_conversions": 0,
                "variation_size": 100,
                "variation_conversions": 10
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("control_size"));
}

#[tokio::test]
async fn calculate_rejects_negative_counts_at_deserialization() {
    let response = app()
        .oneshot(post_json(
            "/api/calculate",
            json!({
                "control_size": 100,
                "control_conversions": -5,
                "variation_size": 100,
                "variation_conversions": 10
            }),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn calculate_rejects_missing_fields() {
    let response = app()
        .oneshot(post_json("/api/calculate", json!({ "control_size": 100 })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// ═══════════════════════════════════════════════════════════════════════
// Health & metrics
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn health_endpoints_respond() {
    for uri in ["/health", "/health/live", "/health/ready"] {
        let response = app().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn health_reports_version_and_uptime() {
    let response = app().oneshot(get("/health")).await.unwrap();
    let body = body_json(response).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn metrics_exposition_includes_service_families() {
    // Drive one request through so counters exist, then scrape.
    let app = app();
    let _ = app
        .clone()
        .oneshot(post_json(
            "/api/calculate",
            json!({
                "control_size": 100,
                "control_conversions": 10,
                "variation_size": 100,
                "variation_conversions": 12
            }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("splitstat_analyses_total"), "got: {text}");
}
