//! Integration tests for the HTTP API.
//!
//! The router is assembled with the same wiring as the binary, backed by
//! in-memory storage, and driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use diy_troubleshooter::adapters::http::{build_router, RouterOptions};
use diy_troubleshooter::adapters::storage::{InMemorySessionStore, InMemoryWorkflowSource};
use diy_troubleshooter::bootstrap::{build_http_state, load_catalogue, Interpretation};
use diy_troubleshooter::config::EngineConfig;

// =============================================================================
// Test Infrastructure
// =============================================================================

async fn app() -> Router {
    let source = InMemoryWorkflowSource::new();
    let catalogue = load_catalogue(&source, true).await.unwrap();
    let engine = EngineConfig::default();

    let state = build_http_state(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(catalogue),
        Interpretation::keyword(&engine),
        engine.max_message_chars,
    );
    build_router(state, &RouterOptions::default())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_session(app: &Router) -> String {
    let (status, body) = call(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

async fn send(app: &Router, id: &str, text: &str) -> (StatusCode, Value) {
    call(
        app,
        "POST",
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "text": text })),
    )
    .await
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn workflows_are_listed() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/api/workflows", None).await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Fix Lukewarm Water"));
}

#[tokio::test]
async fn new_session_starts_in_new_state() {
    let app = app().await;
    let (status, body) = call(&app, "POST", "/api/sessions", None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["state"], "NEW");
}

#[tokio::test]
async fn conversation_over_http() {
    let app = app().await;
    let id = create_session(&app).await;

    let (status, body) = send(&app, &id, "My shower water is lukewarm").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "IN_PROGRESS");
    assert_eq!(body["workflow"], "lukewarm_water");
    assert_eq!(body["current_step"], "check_thermostat");

    let (_, body) = send(&app, &id, "120").await;
    assert_eq!(body["current_step"], "check_breaker");
    assert_eq!(body["terminal"], false);

    let (status, body) = call(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workflow_title"], "Fix Lukewarm Water");
    assert_eq!(body["turns"].as_array().unwrap().len(), 4);
    assert_eq!(body["turns"][0]["role"], "user");
}

#[tokio::test]
async fn helper_guide_is_reported_over_http() {
    let app = app().await;
    let id = create_session(&app).await;

    for text in ["My shower water is lukewarm", "120", "it is on", "normal use"] {
        send(&app, &id, text).await;
    }
    let (status, body) = send(&app, &id, "walk me through it").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_step"], "check_sediment");
    assert_eq!(body["helper"]["workflow"], "drain_water_heater");
    assert_eq!(body["helper"]["step"], "power_off");

    let (_, body) = call(&app, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["helper"]["step"], "power_off");
}

#[tokio::test]
async fn closed_session_returns_conflict() {
    let app = app().await;
    let id = create_session(&app).await;

    for text in ["My shower water is lukewarm", "120", "yes"] {
        send(&app, &id, text).await;
    }
    let (status, body) = send(&app, &id, "done").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "RESOLVED");
    assert_eq!(body["terminal"], true);

    let (status, body) = send(&app, &id, "thanks").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_CLOSED");
}

#[tokio::test]
async fn abandon_is_idempotent() {
    let app = app().await;
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{id}/abandon");

    let (status, body) = call(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "ABANDONED");
    assert_eq!(body["changed"], true);

    let (status, body) = call(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], false);
}

#[tokio::test]
async fn empty_message_is_bad_request() {
    let app = app().await;
    let id = create_session(&app).await;

    let (status, body) = send(&app, &id, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = app().await;
    let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());

    let (status, body) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn malformed_session_id_is_bad_request() {
    let app = app().await;
    let (status, _) = send(&app, "not-a-uuid", "hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
