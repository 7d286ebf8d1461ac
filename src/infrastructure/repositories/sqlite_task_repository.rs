use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::sqlite_store::parse_uuid;
use crate::domain::repositories::TaskRepository;
use crate::domain::task::{Task, TaskContext, TaskPriority};

/// SQLite implementation of TaskRepository
///
/// Ids are stored as hyphenated text; collections and the context as JSON.
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    task_type: String,
    priority: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    assigned_agent: Option<String>,
    parent_task: Option<String>,
    subtasks: Json<Vec<Uuid>>,
    dependencies: Json<Vec<Uuid>>,
    context: Json<TaskContext>,
    result: Option<Json<Value>>,
    error_message: Option<String>,
    estimated_duration_secs: f64,
    actual_duration_secs: Option<f64>,
    deadline: Option<DateTime<Utc>>,
    assignment_attempts: i64,
}

impl TryFrom<TaskRow> for Task {
    type Error = String;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: parse_uuid(&r.id)?,
            title: r.title,
            description: r.description,
            task_type: r.task_type,
            priority: TaskPriority::from_level(r.priority)?,
            status: r.status.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
            started_at: r.started_at,
            assigned_agent: r.assigned_agent,
            parent_task: r.parent_task.as_deref().map(parse_uuid).transpose()?,
            subtasks: r.subtasks.0,
            dependencies: r.dependencies.0,
            context: r.context.0,
            result: r.result.map(|json| json.0),
            error_message: r.error_message,
            estimated_duration_secs: r.estimated_duration_secs,
            actual_duration_secs: r.actual_duration_secs,
            deadline: r.deadline,
            assignment_attempts: u32::try_from(r.assignment_attempts).unwrap_or(0),
        })
    }
}

const SELECT_TASKS: &str = r#"
    SELECT
        id, title, description, task_type, priority, status,
        created_at, updated_at, started_at, assigned_agent, parent_task,
        subtasks, dependencies, context, result, error_message,
        estimated_duration_secs, actual_duration_secs, deadline,
        assignment_attempts
    FROM tasks
"#;

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn save(&self, task: &Task) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, title, description, task_type, priority, status,
                created_at, updated_at, started_at, assigned_agent, parent_task,
                subtasks, dependencies, context, result, error_message,
                estimated_duration_secs, actual_duration_secs, deadline,
                assignment_attempts
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                task_type = excluded.task_type,
                priority = excluded.priority,
                status = excluded.status,
                updated_at = excluded.updated_at,
                started_at = excluded.started_at,
                assigned_agent = excluded.assigned_agent,
                parent_task = excluded.parent_task,
                subtasks = excluded.subtasks,
                dependencies = excluded.dependencies,
                context = excluded.context,
                result = excluded.result,
                error_message = excluded.error_message,
                estimated_duration_secs = excluded.estimated_duration_secs,
                actual_duration_secs = excluded.actual_duration_secs,
                deadline = excluded.deadline,
                assignment_attempts = excluded.assignment_attempts
            "#,
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.task_type)
        .bind(task.priority.level())
        .bind(task.status.as_str())
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.started_at)
        .bind(&task.assigned_agent)
        .bind(task.parent_task.map(|id| id.to_string()))
        .bind(Json(&task.subtasks))
        .bind(Json(&task.dependencies))
        .bind(Json(&task.context))
        .bind(task.result.as_ref().map(Json))
        .bind(&task.error_message)
        .bind(task.estimated_duration_secs)
        .bind(task.actual_duration_secs)
        .bind(task.deadline)
        .bind(i64::from(task.assignment_attempts))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to save task: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, String> {
        let row: Option<TaskRow> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_TASKS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("Failed to find task by id: {}", e))?;

        row.map(Task::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Task>, String> {
        let rows: Vec<TaskRow> =
            sqlx::query_as(&format!("{} ORDER BY created_at, rowid", SELECT_TASKS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| format!("Failed to list tasks: {}", e))?;

        rows.into_iter().map(Task::try_from).collect()
    }
}
