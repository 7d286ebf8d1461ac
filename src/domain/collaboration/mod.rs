// Collaboration domain module
// Contains the collaboration aggregate and its value objects

#![allow(clippy::module_inception)]

pub mod collaboration;
pub mod value_objects;

pub use collaboration::{Collaboration, CollaborationLogEntry, SharedContext};
pub use value_objects::{
    CollaborationPhase, CollaborationStatus, CollaborationType, RoleAssignment, Subtask,
    COORDINATOR_ROLE,
};
