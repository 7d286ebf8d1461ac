// Ports to the outside world: the inference backend and the memory store
//
// Both are injected as trait objects. The coordinator never assumes anything
// about what happens behind them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Hint used for decomposition and integration calls
pub const REASONING_HINT: &str = "reasoning";

/// One call to the execution capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub description: String,
    pub context: Map<String, Value>,
    pub hint: String,
}

impl ExecutionRequest {
    pub fn new(description: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context: Map::new(),
            hint: hint.into(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn insert(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExecutionError {
    #[error("execution failed: {0}")]
    Failed(String),

    #[error("execution backend unavailable: {0}")]
    Unavailable(String),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Opaque backend that turns a request into a result
#[async_trait]
pub trait ExecutionCapability: Send + Sync {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult<Value>;
}

/// Optional sink for task outcomes; failures are logged and ignored
#[async_trait]
pub trait MemoryCapability: Send + Sync {
    async fn record(&self, event_type: &str, payload: Value) -> Result<(), String>;
}

/// Extracts printable text from an execution result
///
/// Strings are used as-is; objects contribute their `output`, `result` or
/// `text` field when it is a string; anything else is rendered as JSON.
pub fn output_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => ["output", "result", "text"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
