use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::coordinator::{Coordinator, TaskStatusReport};
use crate::domain::collaboration::Collaboration;
use crate::domain::task::{NewTask, TaskContext, TaskPriority, TaskStatus};

/// Request body for submitting a task
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    pub title: String,
    pub description: String,
    pub task_type: String,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub context: TaskContext,
    pub estimated_duration_secs: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub parent_task: Option<Uuid>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

impl From<SubmitTaskRequest> for NewTask {
    fn from(req: SubmitTaskRequest) -> Self {
        NewTask {
            title: req.title,
            description: req.description,
            task_type: req.task_type,
            priority: req.priority.unwrap_or(TaskPriority::Medium),
            context: req.context,
            estimated_duration_secs: req.estimated_duration_secs,
            deadline: req.deadline,
            parent_task: req.parent_task,
            dependencies: req.dependencies,
        }
    }
}

/// Response from task submission
#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
}

/// Submit a task for scheduling
///
/// POST /api/tasks
pub async fn submit_task(
    State(coordinator): State<Coordinator>,
    Json(req): Json<SubmitTaskRequest>,
) -> Result<(StatusCode, Json<SubmitTaskResponse>), ApiError> {
    let task_id = coordinator.submit_task(req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitTaskResponse {
            task_id,
            status: TaskStatus::Pending,
        }),
    ))
}

/// Get the status of a task
///
/// GET /api/tasks/:id
pub async fn get_task_status(
    State(coordinator): State<Coordinator>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskStatusReport>, ApiError> {
    Ok(Json(coordinator.task_status(id).await?))
}

/// Cancel a task that has not finished
///
/// POST /api/tasks/:id/cancel
pub async fn cancel_task(
    State(coordinator): State<Coordinator>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    coordinator.cancel_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the collaboration formed for a task
///
/// GET /api/tasks/:id/collaboration
pub async fn get_task_collaboration(
    State(coordinator): State<Coordinator>,
    Path(id): Path<Uuid>,
) -> Result<Json<Collaboration>, ApiError> {
    coordinator
        .collaboration_for_task(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No collaboration for task: {}", id)))
}
