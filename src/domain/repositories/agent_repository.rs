use async_trait::async_trait;

use crate::domain::agent::Agent;

/// Repository trait for Agent records
///
/// Agents are keyed by their catalog id; `save` is an idempotent upsert.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Save an agent (insert or update)
    async fn save(&self, agent: &Agent) -> Result<(), String>;

    /// Find an agent by its catalog id
    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>, String>;

    /// Every stored agent
    async fn find_all(&self) -> Result<Vec<Agent>, String>;
}
