// Repository interfaces (ports)
// Implemented by adapters in the infrastructure layer

use std::sync::Arc;

pub mod agent_repository;
pub mod collaboration_repository;
pub mod metric_repository;
pub mod task_repository;

pub use agent_repository::AgentRepository;
pub use collaboration_repository::CollaborationRepository;
pub use metric_repository::MetricRepository;
pub use task_repository::TaskRepository;

/// The four persistence ports the coordinator writes through
#[derive(Clone)]
pub struct Repositories {
    pub agents: Arc<dyn AgentRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub collaborations: Arc<dyn CollaborationRepository>,
    pub metrics: Arc<dyn MetricRepository>,
}
