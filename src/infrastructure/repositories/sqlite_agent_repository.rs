use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use super::sqlite_store::parse_uuid;
use crate::domain::agent::Agent;
use crate::domain::repositories::AgentRepository;

/// SQLite implementation of AgentRepository
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    agent_type: String,
    name: String,
    description: String,
    capabilities: Json<BTreeSet<String>>,
    specializations: Json<BTreeSet<String>>,
    current_task: Option<String>,
    status: String,
    load_factor: f64,
    success_rate: f64,
    last_active: Option<DateTime<Utc>>,
    total_tasks_completed: i64,
    average_completion_secs: f64,
    preferred_execution_hints: Json<Vec<String>>,
    resource_requirements: Json<BTreeMap<String, String>>,
}

impl TryFrom<AgentRow> for Agent {
    type Error = String;

    fn try_from(r: AgentRow) -> Result<Self, Self::Error> {
        Ok(Agent {
            agent_type: r.agent_type.parse()?,
            status: r.status.parse()?,
            current_task: r.current_task.as_deref().map(parse_uuid).transpose()?,
            id: r.id,
            name: r.name,
            description: r.description,
            capabilities: r.capabilities.0,
            specializations: r.specializations.0,
            load_factor: r.load_factor,
            success_rate: r.success_rate,
            last_active: r.last_active,
            total_tasks_completed: r.total_tasks_completed.max(0) as u64,
            average_completion_secs: r.average_completion_secs,
            preferred_execution_hints: r.preferred_execution_hints.0,
            resource_requirements: r.resource_requirements.0,
        })
    }
}

const SELECT_AGENTS: &str = r#"
    SELECT
        id, agent_type, name, description, capabilities, specializations,
        current_task, status, load_factor, success_rate, last_active,
        total_tasks_completed, average_completion_secs,
        preferred_execution_hints, resource_requirements
    FROM agents
"#;

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn save(&self, agent: &Agent) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO agents (
                id, agent_type, name, description, capabilities, specializations,
                current_task, status, load_factor, success_rate, last_active,
                total_tasks_completed, average_completion_secs,
                preferred_execution_hints, resource_requirements
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                agent_type = excluded.agent_type,
                name = excluded.name,
                description = excluded.description,
                capabilities = excluded.capabilities,
                specializations = excluded.specializations,
                current_task = excluded.current_task,
                status = excluded.status,
                load_factor = excluded.load_factor,
                success_rate = excluded.success_rate,
                last_active = excluded.last_active,
                total_tasks_completed = excluded.total_tasks_completed,
                average_completion_secs = excluded.average_completion_secs,
                preferred_execution_hints = excluded.preferred_execution_hints,
                resource_requirements = excluded.resource_requirements
            "#,
        )
        .bind(&agent.id)
        .bind(agent.agent_type.as_str())
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(Json(&agent.capabilities))
        .bind(Json(&agent.specializations))
        .bind(agent.current_task.map(|id| id.to_string()))
        .bind(agent.status.as_str())
        .bind(agent.load_factor)
        .bind(agent.success_rate)
        .bind(agent.last_active)
        .bind(agent.total_tasks_completed as i64)
        .bind(agent.average_completion_secs)
        .bind(Json(&agent.preferred_execution_hints))
        .bind(Json(&agent.resource_requirements))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to save agent: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>, String> {
        let row: Option<AgentRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_AGENTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("Failed to find agent by id: {}", e))?;

        row.map(Agent::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Agent>, String> {
        let rows: Vec<AgentRow> = sqlx::query_as(&format!("{} ORDER BY rowid", SELECT_AGENTS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| format!("Failed to list agents: {}", e))?;

        rows.into_iter().map(Agent::try_from).collect()
    }
}
