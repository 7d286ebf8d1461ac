use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::coordinator::Coordinator;
use crate::domain::agent::Agent;
use crate::domain::metrics::PerformanceMetric;

/// List every registered agent
///
/// GET /api/agents
pub async fn list_agents(State(coordinator): State<Coordinator>) -> Json<Vec<Agent>> {
    Json(coordinator.agents().await)
}

/// Get one agent by id
///
/// GET /api/agents/:id
pub async fn get_agent(
    State(coordinator): State<Coordinator>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ApiError> {
    Ok(Json(coordinator.agent(&id).await?))
}

/// Performance history of one agent
///
/// GET /api/agents/:id/metrics
pub async fn get_agent_metrics(
    State(coordinator): State<Coordinator>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PerformanceMetric>>, ApiError> {
    coordinator.agent(&id).await?;
    Ok(Json(coordinator.performance_metrics(&id).await?))
}
