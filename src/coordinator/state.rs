use std::collections::HashSet;

use uuid::Uuid;

use super::registry::AgentRegistry;
use super::scheduler::PriorityQueues;
use super::store::TaskStore;

/// Everything the coordination lock protects
///
/// `running` holds the ids of tasks whose execution unit is still alive;
/// the maintenance reaper only releases agents of tasks outside it.
#[derive(Debug, Default)]
pub struct CoordinatorState {
    pub registry: AgentRegistry,
    pub store: TaskStore,
    pub queues: PriorityQueues,
    pub running: HashSet<Uuid>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }
}
