use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::collaboration::Collaboration;

/// Repository trait for the Collaboration aggregate
#[async_trait]
pub trait CollaborationRepository: Send + Sync {
    /// Save a collaboration (insert or update)
    async fn save(&self, collaboration: &Collaboration) -> Result<(), String>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Collaboration>, String>;

    /// The collaboration formed for a task, if any
    async fn find_by_task(&self, task_id: Uuid) -> Result<Option<Collaboration>, String>;

    async fn find_all(&self) -> Result<Vec<Collaboration>, String>;
}
