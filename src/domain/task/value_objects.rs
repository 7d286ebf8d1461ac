use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority, ordered from `Low` to `Emergency`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
    Emergency,
}

impl TaskPriority {
    /// Every priority, highest first (scheduler scan order)
    pub const DESCENDING: [TaskPriority; 5] = [
        TaskPriority::Emergency,
        TaskPriority::Critical,
        TaskPriority::High,
        TaskPriority::Medium,
        TaskPriority::Low,
    ];

    /// Numeric level, 1 (low) through 5 (emergency)
    pub fn level(&self) -> i64 {
        match self {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
            TaskPriority::Critical => 4,
            TaskPriority::Emergency => 5,
        }
    }

    pub fn from_level(level: i64) -> Result<Self, String> {
        match level {
            1 => Ok(TaskPriority::Low),
            2 => Ok(TaskPriority::Medium),
            3 => Ok(TaskPriority::High),
            4 => Ok(TaskPriority::Critical),
            5 => Ok(TaskPriority::Emergency),
            other => Err(format!("Invalid priority level: {}", other)),
        }
    }

    /// Whether agents with a fast track record get a speed bonus for this task
    pub fn is_urgent(&self) -> bool {
        *self >= TaskPriority::High
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
            TaskPriority::Emergency => "emergency",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a task
///
/// # Status Transitions
/// ```text
/// Pending -> Assigned -> InProgress -> Completed
///    |          |            └-------> Failed
///    |          └--------------------> Failed
///    └-------------------------------> Failed
/// (any non-terminal) ----------------> Cancelled
/// ```
/// `Waiting` is reserved for dependency-blocked tasks and nothing moves a
/// task into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Waiting,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Example
    /// ```
    /// use agent_coordinator::domain::task::value_objects::TaskStatus;
    ///
    /// assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Assigned));
    /// assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
    /// ```
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Pending, Assigned)
                | (Pending, Failed)
                | (Assigned, InProgress)
                | (Assigned, Failed)
                | (InProgress, Completed)
                | (InProgress, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "assigned" => Ok(TaskStatus::Assigned),
            "in_progress" => Ok(TaskStatus::InProgress),
            "waiting" => Ok(TaskStatus::Waiting),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("Unknown task status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_ordered() {
        assert!(TaskPriority::Emergency > TaskPriority::Critical);
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Medium);
        assert!(TaskPriority::Medium > TaskPriority::Low);
        assert_eq!(TaskPriority::DESCENDING[0], TaskPriority::Emergency);
        assert_eq!(TaskPriority::DESCENDING[4], TaskPriority::Low);
    }

    #[test]
    fn priority_levels_round_trip() {
        for priority in TaskPriority::DESCENDING {
            assert_eq!(TaskPriority::from_level(priority.level()), Ok(priority));
        }
        assert!(TaskPriority::from_level(0).is_err());
        assert!(TaskPriority::from_level(6).is_err());
    }

    #[test]
    fn urgency() {
        assert!(!TaskPriority::Low.is_urgent());
        assert!(!TaskPriority::Medium.is_urgent());
        assert!(TaskPriority::High.is_urgent());
        assert!(TaskPriority::Emergency.is_urgent());
    }

    #[test]
    fn happy_path_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Assigned));
        assert!(TaskStatus::Assigned.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Failed));
    }

    #[test]
    fn assigned_cannot_be_skipped() {
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Assigned.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn cancel_from_any_non_terminal() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Assigned,
            TaskStatus::InProgress,
            TaskStatus::Waiting,
        ] {
            assert!(status.can_transition_to(TaskStatus::Cancelled), "{}", status);
        }
        for status in [
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert!(!status.can_transition_to(TaskStatus::Cancelled), "{}", status);
        }
    }

    #[test]
    fn nothing_enters_waiting() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Assigned,
            TaskStatus::InProgress,
        ] {
            assert!(!status.can_transition_to(TaskStatus::Waiting));
        }
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Cancelled.can_transition_to(TaskStatus::Pending));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Assigned,
            TaskStatus::InProgress,
            TaskStatus::Waiting,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<TaskStatus>(), Ok(status));
        }
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    }
}
