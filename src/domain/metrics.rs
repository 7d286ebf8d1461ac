use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Metric type written for every finished task
pub const TASK_COMPLETION: &str = "task_completion";

/// Immutable record of one task outcome for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub id: Uuid,
    pub agent_id: String,
    pub task_id: Uuid,
    pub metric_type: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub context: Value,
}

impl PerformanceMetric {
    /// A `task_completion` metric: 1.0 on success, 0.0 otherwise
    pub fn task_completion(
        agent_id: impl Into<String>,
        task_id: Uuid,
        success: bool,
        context: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            task_id,
            metric_type: TASK_COMPLETION.to_string(),
            value: if success { 1.0 } else { 0.0 },
            timestamp: now,
            context,
        }
    }
}
