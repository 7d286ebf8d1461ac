// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::coordinator::Coordinator;
use handlers::{agents, system, tasks};

/// Routes of the coordination API, bound to one coordinator
pub fn router(coordinator: Coordinator) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(system::health_check))
        // Task routes
        .route("/api/tasks", post(tasks::submit_task))
        .route("/api/tasks/:id", get(tasks::get_task_status))
        .route("/api/tasks/:id/cancel", post(tasks::cancel_task))
        .route("/api/tasks/:id/collaboration", get(tasks::get_task_collaboration))
        // Agent routes
        .route("/api/agents", get(agents::list_agents))
        .route("/api/agents/:id", get(agents::get_agent))
        .route("/api/agents/:id/metrics", get(agents::get_agent_metrics))
        // System routes
        .route("/api/system/status", get(system::system_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(coordinator)
}
