use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Schema applied on start-up; every statement is idempotent
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS agents (
        id TEXT PRIMARY KEY,
        agent_type TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        capabilities TEXT NOT NULL,
        specializations TEXT NOT NULL,
        current_task TEXT,
        status TEXT NOT NULL,
        load_factor REAL NOT NULL,
        success_rate REAL NOT NULL,
        last_active TEXT,
        total_tasks_completed INTEGER NOT NULL,
        average_completion_secs REAL NOT NULL,
        preferred_execution_hints TEXT NOT NULL,
        resource_requirements TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        task_type TEXT NOT NULL,
        priority INTEGER NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        started_at TEXT,
        assigned_agent TEXT,
        parent_task TEXT,
        subtasks TEXT NOT NULL,
        dependencies TEXT NOT NULL,
        context TEXT NOT NULL,
        result TEXT,
        error_message TEXT,
        estimated_duration_secs REAL NOT NULL,
        actual_duration_secs REAL,
        deadline TEXT,
        assignment_attempts INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status)",
    r#"
    CREATE TABLE IF NOT EXISTS collaborations (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        participating_agents TEXT NOT NULL,
        primary_agent TEXT NOT NULL,
        task_id TEXT NOT NULL,
        collaboration_type TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        completed_at TEXT,
        shared_context TEXT NOT NULL,
        communication_log TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_collaborations_task ON collaborations (task_id)",
    r#"
    CREATE TABLE IF NOT EXISTS performance_metrics (
        id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        task_id TEXT NOT NULL,
        metric_type TEXT NOT NULL,
        value REAL NOT NULL,
        timestamp TEXT NOT NULL,
        context TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_metrics_agent ON performance_metrics (agent_id)",
];

/// Opens a pool for `database_url`, creating the database file if needed
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Creates any missing tables and indexes
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str) -> Result<uuid::Uuid, String> {
    uuid::Uuid::parse_str(value).map_err(|e| format!("Invalid stored id {}: {}", value, e))
}
