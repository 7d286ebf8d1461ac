use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{TaskPriority, TaskStatus};

/// Domain events raised by the Task aggregate
///
/// Each lifecycle method on [`super::Task`] returns the event describing the
/// transition it performed; the coordinator broadcasts them to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Fired when a task is accepted
    Submitted {
        task_id: Uuid,
        priority: TaskPriority,
    },
    /// Fired when a task is bound to an agent
    Assigned { task_id: Uuid, agent_id: String },
    /// Fired when the assigned agent begins executing
    Started { task_id: Uuid, agent_id: String },
    /// Fired when a task finishes successfully
    Completed { task_id: Uuid },
    /// Fired when a task fails for any reason
    Failed { task_id: Uuid, reason: String },
    /// Fired when a task is cancelled
    Cancelled { task_id: Uuid },
}

impl TaskEvent {
    /// Returns the task_id for this event
    pub fn task_id(&self) -> Uuid {
        match self {
            TaskEvent::Submitted { task_id, .. }
            | TaskEvent::Assigned { task_id, .. }
            | TaskEvent::Started { task_id, .. }
            | TaskEvent::Completed { task_id }
            | TaskEvent::Failed { task_id, .. }
            | TaskEvent::Cancelled { task_id } => *task_id,
        }
    }

    /// Status the task holds after this event
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskEvent::Submitted { .. } => TaskStatus::Pending,
            TaskEvent::Assigned { .. } => TaskStatus::Assigned,
            TaskEvent::Started { .. } => TaskStatus::InProgress,
            TaskEvent::Completed { .. } => TaskStatus::Completed,
            TaskEvent::Failed { .. } => TaskStatus::Failed,
            TaskEvent::Cancelled { .. } => TaskStatus::Cancelled,
        }
    }
}
