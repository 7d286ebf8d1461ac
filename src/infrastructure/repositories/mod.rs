// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::domain::repositories::Repositories;

pub mod in_memory;
pub mod sqlite_agent_repository;
pub mod sqlite_collaboration_repository;
pub mod sqlite_metric_repository;
pub mod sqlite_store;
pub mod sqlite_task_repository;

pub use in_memory::{in_memory_repositories, InMemoryRepository};
pub use sqlite_agent_repository::SqliteAgentRepository;
pub use sqlite_collaboration_repository::SqliteCollaborationRepository;
pub use sqlite_metric_repository::SqliteMetricRepository;
pub use sqlite_task_repository::SqliteTaskRepository;

/// Bundles the SQLite adapters over one pool
pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        agents: Arc::new(SqliteAgentRepository::new(pool.clone())),
        tasks: Arc::new(SqliteTaskRepository::new(pool.clone())),
        collaborations: Arc::new(SqliteCollaborationRepository::new(pool.clone())),
        metrics: Arc::new(SqliteMetricRepository::new(pool)),
    }
}
