use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::coordinator::execution::{
    ExecutionCapability, ExecutionError, ExecutionRequest, ExecutionResult,
};

#[derive(Debug, Clone)]
enum Outcome {
    Respond(Value),
    Fail(String),
    Panic(String),
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: String,
    outcome: Outcome,
    delay: Option<Duration>,
}

/// Deterministic backend driven by substring rules
///
/// The first rule whose pattern occurs in the request description decides
/// the outcome. Requests that match nothing get `{"output": <description>}`.
/// Every request is recorded, in arrival order.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    rules: Vec<Rule>,
    default_delay: Option<Duration>,
    calls: Mutex<Vec<ExecutionRequest>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `value` to requests containing `pattern`
    pub fn respond(mut self, pattern: &str, value: Value) -> Self {
        self.push(pattern, Outcome::Respond(value));
        self
    }

    /// Fail requests containing `pattern`
    pub fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.push(pattern, Outcome::Fail(message.to_string()));
        self
    }

    /// Panic while handling requests containing `pattern`
    pub fn panic_on(mut self, pattern: &str) -> Self {
        self.push(pattern, Outcome::Panic(format!("scripted panic on {}", pattern)));
        self
    }

    /// Sleep before answering requests containing `pattern`
    pub fn delay_on(mut self, pattern: &str, delay: Duration) -> Self {
        match self.rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.delay = Some(delay),
            None => self.rules.push(Rule {
                pattern: pattern.to_string(),
                outcome: Outcome::Respond(Value::Null),
                delay: Some(delay),
            }),
        }
        self
    }

    /// Sleep before answering every request without its own delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Requests received so far
    pub async fn calls(&self) -> Vec<ExecutionRequest> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    fn push(&mut self, pattern: &str, outcome: Outcome) {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            outcome,
            delay: None,
        });
    }
}

#[async_trait]
impl ExecutionCapability for ScriptedExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult<Value> {
        self.calls.lock().await.push(request.clone());

        let rule = self
            .rules
            .iter()
            .find(|r| request.description.contains(&r.pattern));

        if let Some(delay) = rule.and_then(|r| r.delay).or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }

        match rule.map(|r| &r.outcome) {
            Some(Outcome::Respond(Value::Null)) | None => {
                Ok(json!({ "output": request.description }))
            }
            Some(Outcome::Respond(value)) => Ok(value.clone()),
            Some(Outcome::Fail(message)) => Err(ExecutionError::Failed(message.clone())),
            Some(Outcome::Panic(message)) => panic!("{}", message),
        }
    }
}
