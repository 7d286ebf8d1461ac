use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the coordination engine
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("No eligible agent for task {0}")]
    NoEligibleAgent(Uuid),

    #[error("Task execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Task decomposition failed: {0}")]
    DecompositionFailed(String),

    #[error("Execution timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
