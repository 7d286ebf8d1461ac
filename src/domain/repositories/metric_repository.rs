use async_trait::async_trait;

use crate::domain::metrics::PerformanceMetric;

/// Append-only store of performance metrics
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Append a metric; metrics are never updated
    async fn append(&self, metric: &PerformanceMetric) -> Result<(), String>;

    /// Metrics recorded for one agent, oldest first
    async fn find_by_agent(&self, agent_id: &str) -> Result<Vec<PerformanceMetric>, String>;

    async fn find_all(&self) -> Result<Vec<PerformanceMetric>, String>;
}
