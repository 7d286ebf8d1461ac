use axum::{extract::State, Json};

use crate::coordinator::{Coordinator, SystemStatus};

/// Aggregate view of agents, tasks and collaborations
///
/// GET /api/system/status
pub async fn system_status(State(coordinator): State<Coordinator>) -> Json<SystemStatus> {
    Json(coordinator.system_status().await)
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
