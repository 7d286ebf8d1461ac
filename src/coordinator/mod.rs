// Coordination engine
//
// Agent selection, priority scheduling, execution units and hierarchical
// collaboration, all driven through one shared `Coordinator` handle.

pub mod decomposition;
pub mod errors;
pub mod events;
pub mod execution;
pub mod orchestrator;
pub mod performance;
pub mod prompts;
pub mod registry;
pub mod scheduler;
pub mod selector;
pub mod service;
pub mod state;
pub mod store;
mod worker;

// Re-export main types
pub use decomposition::{ListItemParser, SubtaskParser};
pub use errors::{CoordinatorError, CoordinatorResult};
pub use events::{CoordinatorEvent, EventBus};
pub use execution::{
    ExecutionCapability, ExecutionError, ExecutionRequest, ExecutionResult, MemoryCapability,
};
pub use orchestrator::{CollaborationOrchestrator, SubtaskResult};
pub use selector::AgentSelector;
pub use service::{Coordinator, SchedulerHandle, SystemStatus, TaskStatusReport};
