use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::coordinator::execution::{ExecutionCapability, ExecutionRequest, ExecutionResult};

/// Backend that acknowledges every request without doing any work
///
/// Lets the service run end to end when no inference backend is wired in.
#[derive(Debug, Default, Clone)]
pub struct EchoExecutor;

impl EchoExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionCapability for EchoExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult<Value> {
        tracing::debug!(hint = %request.hint, "echo executor handling request");

        Ok(json!({
            "output": format!("Completed: {}", request.description),
            "hint": request.hint,
            "executed_at": Utc::now(),
        }))
    }
}
