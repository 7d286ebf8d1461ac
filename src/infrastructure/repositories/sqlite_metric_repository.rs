use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;

use super::sqlite_store::parse_uuid;
use crate::domain::metrics::PerformanceMetric;
use crate::domain::repositories::MetricRepository;

/// SQLite implementation of MetricRepository
pub struct SqliteMetricRepository {
    pool: SqlitePool,
}

impl SqliteMetricRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MetricRow {
    id: String,
    agent_id: String,
    task_id: String,
    metric_type: String,
    value: f64,
    timestamp: DateTime<Utc>,
    context: Json<Value>,
}

impl TryFrom<MetricRow> for PerformanceMetric {
    type Error = String;

    fn try_from(r: MetricRow) -> Result<Self, Self::Error> {
        Ok(PerformanceMetric {
            id: parse_uuid(&r.id)?,
            agent_id: r.agent_id,
            task_id: parse_uuid(&r.task_id)?,
            metric_type: r.metric_type,
            value: r.value,
            timestamp: r.timestamp,
            context: r.context.0,
        })
    }
}

const SELECT_METRICS: &str = r#"
    SELECT id, agent_id, task_id, metric_type, value, timestamp, context
    FROM performance_metrics
"#;

#[async_trait]
impl MetricRepository for SqliteMetricRepository {
    async fn append(&self, metric: &PerformanceMetric) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO performance_metrics (
                id, agent_id, task_id, metric_type, value, timestamp, context
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(metric.id.to_string())
        .bind(&metric.agent_id)
        .bind(metric.task_id.to_string())
        .bind(&metric.metric_type)
        .bind(metric.value)
        .bind(metric.timestamp)
        .bind(Json(&metric.context))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to append metric: {}", e))?;

        Ok(())
    }

    async fn find_by_agent(&self, agent_id: &str) -> Result<Vec<PerformanceMetric>, String> {
        let rows: Vec<MetricRow> = sqlx::query_as(&format!(
            "{} WHERE agent_id = ?1 ORDER BY timestamp, rowid",
            SELECT_METRICS
        ))
        .bind(agent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to find metrics by agent: {}", e))?;

        rows.into_iter().map(PerformanceMetric::try_from).collect()
    }

    async fn find_all(&self) -> Result<Vec<PerformanceMetric>, String> {
        let rows: Vec<MetricRow> =
            sqlx::query_as(&format!("{} ORDER BY timestamp, rowid", SELECT_METRICS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| format!("Failed to list metrics: {}", e))?;

        rows.into_iter().map(PerformanceMetric::try_from).collect()
    }
}
