//! HTTP-level tests for the item endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, empty_request, json_request, TestApp};
use itemcache_config::{CacheConfig, WritePolicy};
use serde_json::json;
use std::sync::atomic::Ordering;

async fn create(app: &TestApp, name: &str, status: &str) -> String {
    let response = app
        .send(json_request(
            "POST",
            "/api/v1/items",
            json!({"name": name, "status": status, "description": "desc"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["data"]["key"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_then_get() {
    let app = TestApp::new();
    let key = create(&app, "Widget", "current").await;

    let response = app.send(empty_request("GET", &format!("/api/v1/items/{key}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Widget");
    assert_eq!(body["data"]["description"], "desc");
    assert_eq!(body["data"]["status"], "CURRENT");
    assert!(body["data"]["discontinuedAt"].is_null());
}

#[tokio::test]
async fn test_get_missing_item_is_404_with_error_body() {
    let app = TestApp::new();
    let response = app.send(empty_request("GET", "/api/v1/items/missing")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].as_str().unwrap().contains("missing"));
    assert!(body["error"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_create_with_blank_name_is_400() {
    let app = TestApp::new();
    let response = app
        .send(json_request("POST", "/api/v1/items", json!({"name": ""})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_replaces_fields() {
    let app = TestApp::new();
    let key = create(&app, "Widget", "current").await;
    let uri = format!("/api/v1/items/{key}");

    let response = app
        .send(json_request(
            "PUT",
            &uri,
            json!({"name": "Gadget", "status": "DISCONTINUED", "description": "new"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = body_json(app.send(empty_request("GET", &uri)).await).await;
    assert_eq!(body["data"]["name"], "Gadget");
    assert_eq!(body["data"]["status"], "DISCONTINUED");
    assert!(body["data"]["discontinuedAt"].is_string());
}

#[tokio::test]
async fn test_update_without_body_is_400() {
    let app = TestApp::new();
    let key = create(&app, "Widget", "current").await;

    let response = app
        .send(empty_request("PUT", &format!("/api/v1/items/{key}")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_update_via_query() {
    let app = TestApp::new();
    let key = create(&app, "Widget", "current").await;
    let uri = format!("/api/v1/items/{key}");

    let response = app
        .send(empty_request("PUT", &format!("{uri}?status=discontinued")))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = body_json(app.send(empty_request("GET", &uri)).await).await;
    assert_eq!(body["data"]["status"], "DISCONTINUED");
}

#[tokio::test]
async fn test_status_update_with_unknown_status_is_400() {
    let app = TestApp::new();
    let key = create(&app, "Widget", "current").await;

    let response = app
        .send(empty_request("PUT", &format!("/api/v1/items/{key}?status=archived")))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_STATUS");
}

#[tokio::test]
async fn test_update_missing_item_is_404() {
    let app = TestApp::new();
    let response = app
        .send(json_request("PUT", "/api/v1/items/nope", json!({"name": "x"})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stale_version_is_409_under_optimistic_policy() {
    let app = TestApp::with_settings(CacheConfig {
        write_policy: WritePolicy::Optimistic,
        ..CacheConfig::default()
    });
    let key = create(&app, "Widget", "current").await;
    let uri = format!("/api/v1/items/{key}");

    let current = body_json(app.send(empty_request("GET", &uri)).await).await["data"]["version"]
        .as_i64()
        .unwrap();

    let first = app
        .send(json_request("PUT", &uri, json!({"name": "A", "version": current})))
        .await;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let second = app
        .send(json_request("PUT", &uri, json!({"name": "B", "version": current})))
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"]["code"], "VERSION_CONFLICT");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = TestApp::new();
    let key = create(&app, "Widget", "current").await;
    let uri = format!("/api/v1/items/{key}");

    assert_eq!(app.send(empty_request("DELETE", &uri)).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.send(empty_request("DELETE", &uri)).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.send(empty_request("GET", &uri)).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters_and_orders() {
    let app = TestApp::new();
    let discontinued = create(&app, "Old", "discontinued").await;
    let first = create(&app, "First", "current").await;
    let second = create(&app, "Second", "current").await;

    let body = body_json(app.send(empty_request("GET", "/api/v1/items")).await).await;
    let keys: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, [first.as_str(), second.as_str(), discontinued.as_str()]);

    let body = body_json(
        app.send(empty_request("GET", "/api/v1/items?status=DISCONTINUED"))
            .await,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_readiness_reflects_dependencies() {
    let app = TestApp::new();
    let response = app.send(empty_request("GET", "/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.cache_check.up.store(false, Ordering::SeqCst);
    let response = app.send(empty_request("GET", "/ready")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["checks"]["cache"], "down");
    assert_eq!(body["checks"]["store"], "up");
}

#[tokio::test]
async fn test_liveness_and_health() {
    let app = TestApp::new();
    assert_eq!(app.send(empty_request("GET", "/live")).await.status(), StatusCode::OK);

    let body = body_json(app.send(empty_request("GET", "/health")).await).await;
    assert_eq!(body["status"], "healthy");
}
