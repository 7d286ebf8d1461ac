use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{AgentStatus, AgentType};

/// Load added to an agent when it takes on a task and removed on release
pub const LOAD_STEP: f64 = 0.3;

/// Execution hint used when an agent declares no preference
pub const DEFAULT_EXECUTION_HINT: &str = "local";

/// A worker agent and its mutable runtime state
///
/// # Invariants
/// - At most one current task
/// - `load_factor` and `success_rate` stay within [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub agent_type: AgentType,
    pub name: String,
    pub description: String,
    pub capabilities: BTreeSet<String>,
    pub specializations: BTreeSet<String>,
    pub current_task: Option<Uuid>,
    pub status: AgentStatus,
    pub load_factor: f64,
    pub success_rate: f64,
    pub last_active: Option<DateTime<Utc>>,
    pub total_tasks_completed: u64,
    pub average_completion_secs: f64,
    pub preferred_execution_hints: Vec<String>,
    pub resource_requirements: BTreeMap<String, String>,
}

impl Agent {
    /// Create an idle agent with a perfect success record and no history
    pub fn new(
        id: impl Into<String>,
        agent_type: AgentType,
        name: impl Into<String>,
        capabilities: &[&str],
        specializations: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            agent_type,
            name: name.into(),
            description: String::new(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            specializations: specializations.iter().map(|s| s.to_string()).collect(),
            current_task: None,
            status: AgentStatus::Idle,
            load_factor: 0.0,
            success_rate: 1.0,
            last_active: None,
            total_tasks_completed: 0,
            average_completion_secs: 0.0,
            preferred_execution_hints: Vec::new(),
            resource_requirements: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_execution_hints(mut self, hints: &[&str]) -> Self {
        self.preferred_execution_hints = hints.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_resource_requirements(mut self, requirements: &[(&str, &str)]) -> Self {
        self.resource_requirements = requirements
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    /// Whether this agent may be handed new work under the given load threshold
    pub fn is_available(&self, load_balance_threshold: f64) -> bool {
        self.status == AgentStatus::Idle
            && self.current_task.is_none()
            && self.load_factor < load_balance_threshold
    }

    /// Bind a task to this agent
    ///
    /// # Business Rules
    /// - Agent must be idle with no current task
    /// - Load factor grows by [`LOAD_STEP`], capped at 1.0
    pub fn assign(&mut self, task_id: Uuid) -> Result<(), String> {
        if self.status != AgentStatus::Idle || self.current_task.is_some() {
            return Err(format!(
                "Agent {} is not idle (status: {}, task: {:?})",
                self.id, self.status, self.current_task
            ));
        }

        self.current_task = Some(task_id);
        self.status = AgentStatus::Assigned;
        self.set_load_factor(self.load_factor + LOAD_STEP);
        Ok(())
    }

    /// Move an assigned agent into the working state
    pub fn start_working(&mut self, now: DateTime<Utc>) -> Result<(), String> {
        if self.status != AgentStatus::Assigned {
            return Err(format!(
                "Agent {} cannot start working from {} status",
                self.id, self.status
            ));
        }

        self.status = AgentStatus::Working;
        self.last_active = Some(now);
        Ok(())
    }

    /// Return the agent to idle, whatever it was doing
    pub fn release(&mut self) {
        self.current_task = None;
        self.status = AgentStatus::Idle;
        self.set_load_factor(self.load_factor - LOAD_STEP);
    }

    pub fn set_load_factor(&mut self, load_factor: f64) {
        self.load_factor = clamp_unit(load_factor);
    }

    pub fn set_success_rate(&mut self, success_rate: f64) {
        self.success_rate = clamp_unit(success_rate);
    }

    /// First preferred execution hint, or [`DEFAULT_EXECUTION_HINT`]
    pub fn execution_hint(&self) -> &str {
        self.preferred_execution_hints
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_EXECUTION_HINT)
    }

    /// Whether this agent is currently bound to the given task
    pub fn is_bound_to(&self, task_id: Uuid) -> bool {
        self.current_task == Some(task_id)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent::new(
            "dev",
            AgentType::Development,
            "Dev",
            &["code_generation", "debugging"],
            &["rust"],
        )
    }

    #[test]
    fn new_agent_is_idle_and_unloaded() {
        let agent = agent();

        assert_eq!(agent.status, AgentStatus::Idle);
        assert_eq!(agent.load_factor, 0.0);
        assert_eq!(agent.success_rate, 1.0);
        assert!(agent.current_task.is_none());
        assert!(agent.is_available(0.8));
        assert_eq!(agent.capabilities.len(), 2);
    }

    #[test]
    fn assign_start_release_cycle() {
        let mut agent = agent();
        let task_id = Uuid::new_v4();

        agent.assign(task_id).unwrap();
        assert_eq!(agent.status, AgentStatus::Assigned);
        assert!(agent.is_bound_to(task_id));
        assert!((agent.load_factor - LOAD_STEP).abs() < f64::EPSILON);

        let now = Utc::now();
        agent.start_working(now).unwrap();
        assert_eq!(agent.status, AgentStatus::Working);
        assert_eq!(agent.last_active, Some(now));

        agent.release();
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.current_task.is_none());
        assert_eq!(agent.load_factor, 0.0);
    }

    #[test]
    fn busy_agent_rejects_second_task() {
        let mut agent = agent();
        agent.assign(Uuid::new_v4()).unwrap();

        let result = agent.assign(Uuid::new_v4());
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not idle"));
    }

    #[test]
    fn start_requires_assignment() {
        let mut agent = agent();
        assert!(agent.start_working(Utc::now()).is_err());
    }

    #[test]
    fn load_factor_stays_within_bounds() {
        let mut agent = agent();

        for _ in 0..10 {
            agent.assign(Uuid::new_v4()).unwrap();
            agent.status = AgentStatus::Idle;
            agent.current_task = None;
        }
        assert_eq!(agent.load_factor, 1.0);

        for _ in 0..10 {
            agent.release();
        }
        assert_eq!(agent.load_factor, 0.0);

        agent.set_success_rate(1.7);
        assert_eq!(agent.success_rate, 1.0);
        agent.set_success_rate(f64::NAN);
        assert_eq!(agent.success_rate, 0.0);
    }

    #[test]
    fn overloaded_agent_is_unavailable() {
        let mut agent = agent();
        agent.set_load_factor(0.8);
        assert!(!agent.is_available(0.8));
    }

    #[test]
    fn execution_hint_falls_back_to_local() {
        let agent = agent();
        assert_eq!(agent.execution_hint(), DEFAULT_EXECUTION_HINT);

        let agent = agent.with_execution_hints(&["code", "reasoning"]);
        assert_eq!(agent.execution_hint(), "code");
    }
}
