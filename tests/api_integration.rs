//! End-to-end API integration tests
//!
//! These tests drive the HTTP router with `oneshot` requests against a
//! coordinator backed by in-memory repositories:
//! - Task submission, status and cancellation
//! - Agent listing and lookup
//! - System status and health check
//! - Error mapping to HTTP status codes

use std::sync::Arc;

use agent_coordinator::api;
use agent_coordinator::config::CoordinatorConfig;
use agent_coordinator::coordinator::Coordinator;
use agent_coordinator::infrastructure::execution::EchoExecutor;
use agent_coordinator::infrastructure::repositories::{in_memory_repositories, InMemoryRepository};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for oneshot

/// Setup test application over the default agent catalog
///
/// The scheduler is not started, so submitted tasks stay pending.
async fn setup_app() -> Router {
    let coordinator = Coordinator::new(
        CoordinatorConfig::default(),
        in_memory_repositories(Arc::new(InMemoryRepository::new())),
        Arc::new(EchoExecutor::new()),
        None,
    )
    .expect("Failed to build coordinator");
    coordinator
        .initialize()
        .await
        .expect("Failed to initialize coordinator");

    api::router(coordinator)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn submit(app: &Router, body: Value) -> String {
    let (status, body) = send(app, post_json("/api/tasks", body)).await;
    assert_eq!(status, StatusCode::CREATED, "body: {}", body);
    body["task_id"].as_str().expect("task_id").to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_app().await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_submit_and_get_task_status() {
    let app = setup_app().await;

    let task_id = submit(
        &app,
        json!({
            "title": "Quarterly report",
            "description": "Summarize the quarterly numbers",
            "task_type": "analysis",
            "priority": "high",
            "context": {
                "required_capabilities": ["data_processing"],
                "dashboard": "finance"
            }
        }),
    )
    .await;

    let (status, body) = send(&app, get(&format!("/api/tasks/{}", task_id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], task_id.as_str());
    assert_eq!(body["status"], "pending");
    assert_eq!(body["progress_percent"], 0.0);
    assert_eq!(body["assigned_agent"], Value::Null);
}

#[tokio::test]
async fn test_submit_defaults_priority_to_medium() {
    let app = setup_app().await;

    submit(
        &app,
        json!({"title": "T", "description": "D", "task_type": "research"}),
    )
    .await;

    let (_, body) = send(&app, get("/api/system/status")).await;
    assert_eq!(body["pending_tasks"], 1);
}

#[tokio::test]
async fn test_submit_blank_title_is_bad_request() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/tasks",
            json!({"title": "  ", "description": "D", "task_type": "research"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Title cannot be empty"));
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let app = setup_app().await;

    let (status, body) = send(&app, get(&format!("/api/tasks/{}", uuid::Uuid::new_v4()))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Task not found"));
}

#[tokio::test]
async fn test_cancel_task_then_conflict() {
    let app = setup_app().await;
    let task_id = submit(
        &app,
        json!({"title": "T", "description": "D", "task_type": "system", "priority": "low"}),
    )
    .await;
    let cancel = format!("/api/tasks/{}/cancel", task_id);

    let (status, _) = send(&app, post_json(&cancel, json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, get(&format!("/api/tasks/{}", task_id))).await;
    assert_eq!(body["status"], "cancelled");

    let (status, body) = send(&app, post_json(&cancel, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("cancelled"));
}

#[tokio::test]
async fn test_task_without_collaboration_is_not_found() {
    let app = setup_app().await;
    let task_id = submit(
        &app,
        json!({"title": "T", "description": "D", "task_type": "system"}),
    )
    .await;

    let (status, _) = send(&app, get(&format!("/api/tasks/{}/collaboration", task_id))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_and_get_agents() {
    let app = setup_app().await;

    let (status, body) = send(&app, get("/api/agents")).await;
    assert_eq!(status, StatusCode::OK);
    let agents = body.as_array().unwrap();
    assert_eq!(agents.len(), 8);
    assert_eq!(agents[0]["id"], "research_specialist");

    let (status, body) = send(&app, get("/api/agents/coordination_master")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agent_type"], "coordination");
    assert_eq!(body["status"], "idle");

    let (status, body) = send(&app, get("/api/agents/coordination_master/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(&app, get("/api/agents/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/agents/nobody/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_system_status() {
    let app = setup_app().await;

    let (status, body) = send(&app, get("/api/system/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_agents"], 8);
    assert_eq!(body["active_agents"], 0);
    assert_eq!(body["pending_tasks"], 0);
    assert_eq!(body["active_collaborations"], 0);
    assert_eq!(body["mean_load_factor"], 0.0);
}
