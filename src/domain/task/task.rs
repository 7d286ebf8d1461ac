use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::context::TaskContext;
use super::events::TaskEvent;
use super::value_objects::{TaskPriority, TaskStatus};

/// Estimate used when the caller gives none (five minutes)
pub const DEFAULT_ESTIMATED_DURATION_SECS: f64 = 300.0;

/// Progress reported for in-flight tasks never exceeds this until completion
const MAX_IN_FLIGHT_PROGRESS: f64 = 90.0;

/// Progress reported for in-flight tasks without a duration estimate
const UNKNOWN_PROGRESS: f64 = 50.0;

/// Input accepted when submitting a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: TaskPriority,
    #[serde(default)]
    pub context: TaskContext,
    #[serde(default)]
    pub estimated_duration_secs: Option<f64>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_task: Option<Uuid>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        task_type: impl Into<String>,
        priority: TaskPriority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            task_type: task_type.into(),
            priority,
            context: TaskContext::default(),
            estimated_duration_secs: None,
            deadline: None,
            parent_task: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: TaskContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_estimated_duration(mut self, secs: f64) -> Self {
        self.estimated_duration_secs = Some(secs);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// A unit of work and its lifecycle state
///
/// Status only changes through the lifecycle methods, each of which checks
/// [`TaskStatus::can_transition_to`] and returns the [`TaskEvent`] it raised.
///
/// # Example
/// ```
/// use agent_coordinator::domain::task::{NewTask, Task, TaskPriority, TaskStatus};
///
/// let (task, _event) = Task::new(NewTask::new(
///     "Summarize",
///     "Summarize the quarterly report",
///     "research",
///     TaskPriority::Medium,
/// ))
/// .expect("valid task");
///
/// assert_eq!(task.status, TaskStatus::Pending);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub task_type: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub assigned_agent: Option<String>,
    pub parent_task: Option<Uuid>,
    pub subtasks: Vec<Uuid>,
    pub dependencies: Vec<Uuid>,
    pub context: TaskContext,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub estimated_duration_secs: f64,
    pub actual_duration_secs: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub assignment_attempts: u32,
}

impl Task {
    /// Creates a pending task
    ///
    /// # Business Rules Enforced
    /// - Title and description must not be blank
    /// - Estimated duration must be finite and non-negative
    pub fn new(input: NewTask) -> Result<(Self, TaskEvent), String> {
        if input.title.trim().is_empty() {
            return Err("Title cannot be empty".to_string());
        }
        if input.description.trim().is_empty() {
            return Err("Description cannot be empty".to_string());
        }

        let estimated = input
            .estimated_duration_secs
            .unwrap_or(DEFAULT_ESTIMATED_DURATION_SECS);
        if !estimated.is_finite() || estimated < 0.0 {
            return Err("Estimated duration must be a non-negative number".to_string());
        }

        let now = Utc::now();
        let task = Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            task_type: input.task_type,
            priority: input.priority,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            assigned_agent: None,
            parent_task: input.parent_task,
            subtasks: Vec::new(),
            dependencies: input.dependencies,
            context: input.context,
            result: None,
            error_message: None,
            estimated_duration_secs: estimated,
            actual_duration_secs: None,
            deadline: input.deadline,
            assignment_attempts: 0,
        };

        let event = TaskEvent::Submitted {
            task_id: task.id,
            priority: task.priority,
        };

        Ok((task, event))
    }

    /// Binds the task to an agent (Pending -> Assigned)
    pub fn assign(&mut self, agent_id: &str, now: DateTime<Utc>) -> Result<TaskEvent, String> {
        self.transition(TaskStatus::Assigned, now)?;
        self.assigned_agent = Some(agent_id.to_string());

        Ok(TaskEvent::Assigned {
            task_id: self.id,
            agent_id: agent_id.to_string(),
        })
    }

    /// Marks execution as started (Assigned -> InProgress)
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<TaskEvent, String> {
        self.transition(TaskStatus::InProgress, now)?;
        self.started_at = Some(now);

        Ok(TaskEvent::Started {
            task_id: self.id,
            agent_id: self.assigned_agent.clone().unwrap_or_default(),
        })
    }

    /// Completes the task with its result (InProgress -> Completed)
    pub fn complete(&mut self, result: Value, now: DateTime<Utc>) -> Result<TaskEvent, String> {
        self.transition(TaskStatus::Completed, now)?;
        self.result = Some(result);
        self.actual_duration_secs = self.elapsed_since_start(now);

        Ok(TaskEvent::Completed { task_id: self.id })
    }

    /// Marks the task failed with a reason
    pub fn fail(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> Result<TaskEvent, String> {
        let reason = reason.into();
        self.transition(TaskStatus::Failed, now)?;
        self.error_message = Some(reason.clone());
        self.actual_duration_secs = self.elapsed_since_start(now);

        Ok(TaskEvent::Failed {
            task_id: self.id,
            reason,
        })
    }

    /// Cancels a task that has not yet finished
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<TaskEvent, String> {
        self.transition(TaskStatus::Cancelled, now)?;
        Ok(TaskEvent::Cancelled { task_id: self.id })
    }

    /// Counts a failed attempt to find an agent and returns the new total
    pub fn record_assignment_attempt(&mut self, now: DateTime<Utc>) -> u32 {
        self.assignment_attempts += 1;
        self.updated_at = now;
        self.assignment_attempts
    }

    /// Seconds since execution started, if it has
    pub fn elapsed_since_start(&self, now: DateTime<Utc>) -> Option<f64> {
        self.started_at.map(|started| seconds_between(started, now))
    }

    /// Whether execution has been running longer than `timeout`
    pub fn has_exceeded(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::InProgress
            && self
                .elapsed_since_start(now)
                .is_some_and(|elapsed| elapsed > timeout.as_secs_f64())
    }

    /// Whether an unfinished task has passed its deadline
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.deadline.is_some_and(|deadline| now > deadline)
    }

    /// Estimated completion percentage at `now`
    ///
    /// Completed tasks report 100 and in-flight tasks are estimated from the
    /// time elapsed since submission against `estimated_duration_secs`,
    /// capped at 90. Every other status reports 0.
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        match self.status {
            TaskStatus::Completed => 100.0,
            TaskStatus::InProgress => {
                if self.estimated_duration_secs > 0.0 {
                    let elapsed = seconds_between(self.created_at, now);
                    (elapsed / self.estimated_duration_secs * 100.0).min(MAX_IN_FLIGHT_PROGRESS)
                } else {
                    UNKNOWN_PROGRESS
                }
            }
            _ => 0.0,
        }
    }

    fn transition(&mut self, next: TaskStatus, now: DateTime<Utc>) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Cannot move task {} from {} to {}",
                self.id, self.status, next
            ));
        }

        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let millis = (to - from).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    fn new_task() -> Task {
        Task::new(NewTask::new(
            "Write docs",
            "Write the API documentation",
            "communication",
            TaskPriority::Medium,
        ))
        .unwrap()
        .0
    }

    #[test]
    fn create_task_with_valid_input() {
        let (task, event) = Task::new(NewTask::new(
            "Title",
            "Description",
            "research",
            TaskPriority::High,
        ))
        .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.estimated_duration_secs, DEFAULT_ESTIMATED_DURATION_SECS);
        assert_eq!(task.assignment_attempts, 0);
        assert_eq!(
            event,
            TaskEvent::Submitted {
                task_id: task.id,
                priority: TaskPriority::High
            }
        );
    }

    #[test]
    fn create_task_with_empty_title_fails() {
        let result = Task::new(NewTask::new(" ", "Description", "research", TaskPriority::Low));
        assert!(result.unwrap_err().contains("Title cannot be empty"));
    }

    #[test]
    fn create_task_with_negative_estimate_fails() {
        let input = NewTask::new("T", "D", "research", TaskPriority::Low).with_estimated_duration(-1.0);
        assert!(Task::new(input).is_err());
    }

    #[test]
    fn full_lifecycle() {
        let mut task = new_task();
        let now = Utc::now();

        task.assign("agent-1", now).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.assigned_agent.as_deref(), Some("agent-1"));

        task.start(now).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.started_at, Some(now));

        let later = now + ChronoDuration::seconds(12);
        task.complete(json!({"answer": 42}), later).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result, Some(json!({"answer": 42})));
        assert_eq!(task.actual_duration_secs, Some(12.0));
        assert_eq!(task.updated_at, later);
    }

    #[test]
    fn cannot_start_without_assignment() {
        let mut task = new_task();
        let result = task.start(Utc::now());

        assert!(result.is_err());
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn failure_records_reason() {
        let mut task = new_task();
        let now = Utc::now();
        task.assign("a", now).unwrap();
        task.start(now).unwrap();

        let event = task.fail("backend unavailable", now).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("backend unavailable"));
        assert_eq!(event.status(), TaskStatus::Failed);
    }

    #[test]
    fn completed_task_cannot_be_cancelled() {
        let mut task = new_task();
        let now = Utc::now();
        task.assign("a", now).unwrap();
        task.start(now).unwrap();
        task.complete(json!(null), now).unwrap();

        assert!(task.cancel(now).is_err());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn progress_is_proportional_then_capped() {
        let mut task = new_task();
        task.estimated_duration_secs = 100.0;
        let created = task.created_at;
        task.assign("a", created).unwrap();
        task.start(created).unwrap();

        assert_eq!(task.progress_at(created + ChronoDuration::seconds(40)), 40.0);
        assert_eq!(task.progress_at(created + ChronoDuration::seconds(1000)), 90.0);
    }

    #[test]
    fn progress_by_status() {
        let mut task = new_task();
        let now = Utc::now();
        assert_eq!(task.progress_at(now), 0.0);

        task.assign("a", now).unwrap();
        task.start(now).unwrap();
        task.estimated_duration_secs = 0.0;
        assert_eq!(task.progress_at(now), 50.0);

        task.fail("x", now).unwrap();
        assert_eq!(task.progress_at(now), 0.0);
    }

    #[test]
    fn timeout_and_deadline_checks() {
        let mut task = new_task();
        let now = Utc::now();
        task.deadline = Some(now + ChronoDuration::seconds(5));
        assert!(!task.is_past_deadline(now));
        assert!(task.is_past_deadline(now + ChronoDuration::seconds(6)));

        task.assign("a", now).unwrap();
        task.start(now).unwrap();
        let timeout = Duration::from_secs(60);
        assert!(!task.has_exceeded(timeout, now + ChronoDuration::seconds(59)));
        assert!(task.has_exceeded(timeout, now + ChronoDuration::seconds(61)));
    }
}
