pub mod agents;
pub mod system;
pub mod tasks;
