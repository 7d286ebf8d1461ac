// Agent domain module
// Contains the agent record, its value objects and the default catalog

#![allow(clippy::module_inception)]

pub mod agent;
pub mod catalog;
pub mod value_objects;

pub use agent::Agent;
pub use catalog::default_agents;
pub use value_objects::{AgentStatus, AgentType};
