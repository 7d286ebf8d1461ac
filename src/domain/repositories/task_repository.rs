use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::task::Task;

/// Repository trait for the Task aggregate
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Save a task (insert or update)
    async fn save(&self, task: &Task) -> Result<(), String>;

    /// Find a task by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, String>;

    /// Every stored task, oldest first
    async fn find_all(&self) -> Result<Vec<Task>, String>;
}
