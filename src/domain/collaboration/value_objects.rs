use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a collaboration
///
/// # Status Transitions
/// ```text
/// Active -> Completed
///    └----> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaborationStatus {
    Active,
    Completed,
    Failed,
}

impl CollaborationStatus {
    pub fn can_transition_to(&self, next: CollaborationStatus) -> bool {
        use CollaborationStatus::*;
        matches!((self, next), (Active, Completed) | (Active, Failed))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationStatus::Active => "active",
            CollaborationStatus::Completed => "completed",
            CollaborationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CollaborationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollaborationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CollaborationStatus::Active),
            "completed" => Ok(CollaborationStatus::Completed),
            "failed" => Ok(CollaborationStatus::Failed),
            other => Err(format!("Unknown collaboration status: {}", other)),
        }
    }
}

/// How participants are organized; only the hierarchical pattern exists today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaborationType {
    Hierarchical,
}

impl CollaborationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationType::Hierarchical => "hierarchical",
        }
    }
}

impl FromStr for CollaborationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hierarchical" => Ok(CollaborationType::Hierarchical),
            other => Err(format!("Unknown collaboration type: {}", other)),
        }
    }
}

/// Protocol phase recorded in the communication log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationPhase {
    Formed,
    Decomposed,
    SubtasksExecuted,
    Integrated,
    Completed,
    Failed,
}

impl CollaborationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationPhase::Formed => "formed",
            CollaborationPhase::Decomposed => "decomposed",
            CollaborationPhase::SubtasksExecuted => "subtasks_executed",
            CollaborationPhase::Integrated => "integrated",
            CollaborationPhase::Completed => "completed",
            CollaborationPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for CollaborationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role label given to the primary agent of every collaboration
pub const COORDINATOR_ROLE: &str = "coordinator";

/// Participant and the role it plays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub agent_id: String,
    pub role: String,
}

/// One unit of work produced by decomposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
}

impl Subtask {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            details: String::new(),
        }
    }
}
