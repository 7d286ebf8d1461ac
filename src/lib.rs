//! Agent Coordinator Library
//!
//! Multi-agent task coordination: a registry of worker agents, priority
//! scheduling with capability-based selection, hierarchical collaboration
//! for complex tasks, and persistence of agents, tasks and metrics.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod infrastructure;
