use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::agent::Agent;
use crate::domain::metrics::PerformanceMetric;
use crate::domain::task::Task;

/// Online update of agent statistics from task outcomes
#[derive(Debug, Default, Clone, Copy)]
pub struct PerformanceTracker;

impl PerformanceTracker {
    /// Folds one outcome into the agent's running averages
    ///
    /// With `n` prior outcomes: `success_rate' = (sr * n + s) / (n + 1)` and
    /// `avg' = (avg * n + duration) / (n + 1)`. Returns the metric to append.
    pub fn record_outcome(
        agent: &mut Agent,
        task: &Task,
        success: bool,
        duration_secs: f64,
        now: DateTime<Utc>,
    ) -> PerformanceMetric {
        let n = agent.total_tasks_completed as f64;
        let outcome = if success { 1.0 } else { 0.0 };
        let duration = duration_secs.max(0.0);

        agent.set_success_rate((agent.success_rate * n + outcome) / (n + 1.0));
        agent.average_completion_secs = (agent.average_completion_secs * n + duration) / (n + 1.0);
        agent.total_tasks_completed += 1;
        agent.last_active = Some(now);

        PerformanceMetric::task_completion(
            agent.id.clone(),
            task.id,
            success,
            json!({
                "duration_secs": duration,
                "priority": task.priority,
                "task_type": task.task_type,
            }),
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentType;
    use crate::domain::task::{NewTask, TaskPriority};

    fn task() -> Task {
        Task::new(NewTask::new("T", "D", "research", TaskPriority::High))
            .unwrap()
            .0
    }

    #[test]
    fn first_outcome_replaces_defaults() {
        let mut agent = Agent::new("a", AgentType::Research, "A", &[], &[]);
        let task = task();

        let metric = PerformanceTracker::record_outcome(&mut agent, &task, false, 40.0, Utc::now());

        assert_eq!(agent.success_rate, 0.0);
        assert_eq!(agent.average_completion_secs, 40.0);
        assert_eq!(agent.total_tasks_completed, 1);
        assert_eq!(metric.value, 0.0);
        assert_eq!(metric.metric_type, "task_completion");
        assert_eq!(metric.context["priority"], "high");
    }

    #[test]
    fn running_averages() {
        let mut agent = Agent::new("a", AgentType::Research, "A", &[], &[]);
        agent.success_rate = 0.5;
        agent.average_completion_secs = 100.0;
        agent.total_tasks_completed = 3;

        let metric = PerformanceTracker::record_outcome(&mut agent, &task(), true, 20.0, Utc::now());

        // (0.5 * 3 + 1) / 4 and (100 * 3 + 20) / 4
        assert!((agent.success_rate - 0.625).abs() < 1e-9);
        assert!((agent.average_completion_secs - 80.0).abs() < 1e-9);
        assert_eq!(agent.total_tasks_completed, 4);
        assert_eq!(metric.value, 1.0);
        assert_eq!(metric.agent_id, "a");
    }
}
