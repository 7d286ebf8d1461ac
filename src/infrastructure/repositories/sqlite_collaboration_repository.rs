use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::sqlite_store::parse_uuid;
use crate::domain::collaboration::{Collaboration, CollaborationLogEntry, SharedContext};
use crate::domain::repositories::CollaborationRepository;

/// SQLite implementation of CollaborationRepository
pub struct SqliteCollaborationRepository {
    pool: SqlitePool,
}

impl SqliteCollaborationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CollaborationRow {
    id: String,
    title: String,
    participating_agents: Json<Vec<String>>,
    primary_agent: String,
    task_id: String,
    collaboration_type: String,
    status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    shared_context: Json<SharedContext>,
    communication_log: Json<Vec<CollaborationLogEntry>>,
}

impl TryFrom<CollaborationRow> for Collaboration {
    type Error = String;

    fn try_from(r: CollaborationRow) -> Result<Self, Self::Error> {
        Ok(Collaboration {
            id: parse_uuid(&r.id)?,
            title: r.title,
            participating_agents: r.participating_agents.0,
            primary_agent: r.primary_agent,
            task_id: parse_uuid(&r.task_id)?,
            collaboration_type: r.collaboration_type.parse()?,
            status: r.status.parse()?,
            created_at: r.created_at,
            completed_at: r.completed_at,
            shared_context: r.shared_context.0,
            communication_log: r.communication_log.0,
        })
    }
}

const SELECT_COLLABORATIONS: &str = r#"
    SELECT
        id, title, participating_agents, primary_agent, task_id,
        collaboration_type, status, created_at, completed_at,
        shared_context, communication_log
    FROM collaborations
"#;

#[async_trait]
impl CollaborationRepository for SqliteCollaborationRepository {
    async fn save(&self, collaboration: &Collaboration) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO collaborations (
                id, title, participating_agents, primary_agent, task_id,
                collaboration_type, status, created_at, completed_at,
                shared_context, communication_log
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                participating_agents = excluded.participating_agents,
                primary_agent = excluded.primary_agent,
                status = excluded.status,
                completed_at = excluded.completed_at,
                shared_context = excluded.shared_context,
                communication_log = excluded.communication_log
            "#,
        )
        .bind(collaboration.id.to_string())
        .bind(&collaboration.title)
        .bind(Json(&collaboration.participating_agents))
        .bind(&collaboration.primary_agent)
        .bind(collaboration.task_id.to_string())
        .bind(collaboration.collaboration_type.as_str())
        .bind(collaboration.status.as_str())
        .bind(collaboration.created_at)
        .bind(collaboration.completed_at)
        .bind(Json(&collaboration.shared_context))
        .bind(Json(&collaboration.communication_log))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to save collaboration: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Collaboration>, String> {
        let row: Option<CollaborationRow> =
            sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_COLLABORATIONS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| format!("Failed to find collaboration by id: {}", e))?;

        row.map(Collaboration::try_from).transpose()
    }

    async fn find_by_task(&self, task_id: Uuid) -> Result<Option<Collaboration>, String> {
        let row: Option<CollaborationRow> = sqlx::query_as(&format!(
            "{} WHERE task_id = ?1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLLABORATIONS
        ))
        .bind(task_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find collaboration by task: {}", e))?;

        row.map(Collaboration::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Collaboration>, String> {
        let rows: Vec<CollaborationRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at, rowid", SELECT_COLLABORATIONS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| format!("Failed to list collaborations: {}", e))?;

        rows.into_iter().map(Collaboration::try_from).collect()
    }
}
