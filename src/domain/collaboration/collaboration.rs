use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::value_objects::{
    CollaborationPhase, CollaborationStatus, CollaborationType, RoleAssignment, Subtask,
};

/// State shared between participants of a collaboration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedContext {
    pub roles: Vec<RoleAssignment>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Timestamped entry in the append-only communication log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationLogEntry {
    pub timestamp: DateTime<Utc>,
    pub phase: CollaborationPhase,
    pub content: Value,
}

/// A multi-agent session working on one complex task
///
/// # Invariants
/// - At least one participant, the primary agent first
/// - The communication log only grows
/// - Status leaves `Active` exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaboration {
    pub id: Uuid,
    pub title: String,
    pub participating_agents: Vec<String>,
    pub primary_agent: String,
    pub task_id: Uuid,
    pub collaboration_type: CollaborationType,
    pub status: CollaborationStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub shared_context: SharedContext,
    pub communication_log: Vec<CollaborationLogEntry>,
}

impl Collaboration {
    /// Forms a hierarchical collaboration from a role roster
    ///
    /// The first roster entry is the primary agent. A `formed` entry carrying
    /// the roster is logged immediately.
    pub fn form(
        task_id: Uuid,
        title: impl Into<String>,
        roles: Vec<RoleAssignment>,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        let primary_agent = roles
            .first()
            .map(|r| r.agent_id.clone())
            .ok_or_else(|| "A collaboration needs at least one participant".to_string())?;

        let mut collaboration = Self {
            id: Uuid::new_v4(),
            title: title.into(),
            participating_agents: roles.iter().map(|r| r.agent_id.clone()).collect(),
            primary_agent,
            task_id,
            collaboration_type: CollaborationType::Hierarchical,
            status: CollaborationStatus::Active,
            created_at: now,
            completed_at: None,
            shared_context: SharedContext {
                roles,
                subtasks: Vec::new(),
            },
            communication_log: Vec::new(),
        };

        let roster = json!({ "roles": collaboration.shared_context.roles });
        collaboration.log(CollaborationPhase::Formed, roster, now);
        Ok(collaboration)
    }

    /// Participants other than the primary agent, in roster order
    pub fn helpers(&self) -> impl Iterator<Item = &RoleAssignment> {
        self.shared_context.roles.iter().skip(1)
    }

    pub fn is_active(&self) -> bool {
        self.status == CollaborationStatus::Active
    }

    pub fn log(&mut self, phase: CollaborationPhase, content: Value, now: DateTime<Utc>) {
        self.communication_log.push(CollaborationLogEntry {
            timestamp: now,
            phase,
            content,
        });
    }

    /// Stores the decomposition and logs it
    pub fn record_decomposition(&mut self, subtasks: Vec<Subtask>, now: DateTime<Utc>) {
        let content = json!({ "subtasks": subtasks });
        self.shared_context.subtasks = subtasks;
        self.log(CollaborationPhase::Decomposed, content, now);
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), String> {
        self.finish(CollaborationStatus::Completed, now)?;
        self.log(CollaborationPhase::Completed, Value::Null, now);
        Ok(())
    }

    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), String> {
        self.finish(CollaborationStatus::Failed, now)?;
        self.log(CollaborationPhase::Failed, json!({ "reason": reason }), now);
        Ok(())
    }

    fn finish(&mut self, next: CollaborationStatus, now: DateTime<Utc>) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Cannot move collaboration {} from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        self.completed_at = Some(now);
        Ok(())
    }
}
