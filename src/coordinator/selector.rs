use chrono::{DateTime, Duration, Utc};

use crate::domain::agent::{Agent, AgentStatus, AgentType};
use crate::domain::task::Task;

/// Minimum share of required capabilities an agent must hold
const MIN_COVERAGE: f64 = 0.5;

/// Specialization overlaps beyond this earn nothing extra
const MAX_SPECIALIZATION_OVERLAP: usize = 2;

/// Baseline completion time for the speed bonus, in seconds
const SPEED_BASELINE_SECS: f64 = 300.0;

const SUCCESS_WEIGHT: f64 = 30.0;
const IDLE_CAPACITY_WEIGHT: f64 = 20.0;
const COVERAGE_WEIGHT: f64 = 25.0;
const SPECIALIZATION_WEIGHT: f64 = 15.0;
const RECENT_ACTIVITY_BONUS: f64 = 10.0;
const SPEED_WEIGHT: f64 = 10.0;

/// Agent types allowed to take a task of the given type when the task names
/// no required capabilities
fn eligible_types(task_type: &str) -> &'static [AgentType] {
    use AgentType::*;
    match task_type {
        "research" => &[Research, Analysis],
        "development" => &[Development, Automation],
        "analysis" => &[Analysis, Research],
        "automation" => &[Automation, System],
        "communication" => &[Communication, Creative],
        "creative" => &[Creative, Communication],
        "system" => &[System, Automation],
        _ => &[],
    }
}

/// Picks the best idle agent for a task
#[derive(Debug, Clone, Copy)]
pub struct AgentSelector {
    load_balance_threshold: f64,
}

impl AgentSelector {
    pub fn new(load_balance_threshold: f64) -> Self {
        Self {
            load_balance_threshold,
        }
    }

    /// Fraction of the task's required capabilities the agent holds
    ///
    /// Zero when the task requires nothing in particular.
    pub fn coverage(agent: &Agent, task: &Task) -> f64 {
        let required = &task.context.required_capabilities;
        if required.is_empty() {
            return 0.0;
        }
        let held = required
            .iter()
            .filter(|c| agent.capabilities.contains(*c))
            .count();
        held as f64 / required.len() as f64
    }

    pub fn can_handle(agent: &Agent, task: &Task) -> bool {
        if task.context.required_capabilities.is_empty() {
            agent.agent_type == AgentType::Coordination
                || eligible_types(&task.task_type).contains(&agent.agent_type)
        } else {
            Self::coverage(agent, task) >= MIN_COVERAGE
        }
    }

    pub fn is_eligible(&self, agent: &Agent, task: &Task) -> bool {
        agent.status == AgentStatus::Idle
            && agent.current_task.is_none()
            && agent.load_factor < self.load_balance_threshold
            && Self::can_handle(agent, task)
    }

    /// Suitability of `agent` for `task`; higher is better
    pub fn score(agent: &Agent, task: &Task, now: DateTime<Utc>) -> f64 {
        let mut score = agent.success_rate * SUCCESS_WEIGHT;
        score += (1.0 - agent.load_factor) * IDLE_CAPACITY_WEIGHT;
        score += Self::coverage(agent, task) * COVERAGE_WEIGHT;

        let overlap = task
            .context
            .specializations
            .intersection(&agent.specializations)
            .count()
            .min(MAX_SPECIALIZATION_OVERLAP);
        score += overlap as f64 * SPECIALIZATION_WEIGHT;

        if agent
            .last_active
            .is_some_and(|active| now - active < Duration::hours(1))
        {
            score += RECENT_ACTIVITY_BONUS;
        }

        if task.priority.is_urgent() && agent.average_completion_secs > 0.0 {
            let speed = (SPEED_BASELINE_SECS / agent.average_completion_secs).min(1.0);
            score += speed * SPEED_WEIGHT;
        }

        score
    }

    /// The highest-scoring eligible agent; ties go to the earliest candidate
    pub fn select<'a>(
        &self,
        agents: impl IntoIterator<Item = &'a Agent>,
        task: &Task,
        now: DateTime<Utc>,
    ) -> Option<&'a Agent> {
        let mut best: Option<(&Agent, f64)> = None;

        for agent in agents.into_iter().filter(|a| self.is_eligible(a, task)) {
            let score = Self::score(agent, task, now);
            tracing::debug!(task_id = %task.id, agent_id = %agent.id, score, "scored agent");

            if best.map_or(true, |(_, top)| score > top) {
                best = Some((agent, score));
            }
        }

        best.map(|(agent, _)| agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{NewTask, TaskContext, TaskPriority};
    use uuid::Uuid;

    fn task(task_type: &str, priority: TaskPriority, context: TaskContext) -> Task {
        Task::new(NewTask::new("T", "D", task_type, priority).with_context(context))
            .unwrap()
            .0
    }

    fn dev(id: &str, capabilities: &[&str]) -> Agent {
        Agent::new(id, AgentType::Development, id, capabilities, &[])
    }

    #[test]
    fn better_record_and_lower_load_wins() {
        let now = Utc::now();
        let task = task(
            "development",
            TaskPriority::Medium,
            TaskContext::default().with_required_capabilities(&["code_generation"]),
        );

        let mut a = dev("a", &["code_generation"]);
        a.set_success_rate(0.9);
        a.set_load_factor(0.1);
        let mut b = dev("b", &["code_generation"]);
        b.set_success_rate(0.6);
        b.set_load_factor(0.5);

        // a: 27 + 18 + 25 = 70, b: 18 + 10 + 25 = 53
        assert!((AgentSelector::score(&a, &task, now) - 70.0).abs() < 1e-9);
        assert!((AgentSelector::score(&b, &task, now) - 53.0).abs() < 1e-9);

        let agents = [b.clone(), a.clone()];
        let selected = AgentSelector::new(0.8).select(agents.iter(), &task, now);
        assert_eq!(selected.map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn capability_coverage_beats_equal_record() {
        let now = Utc::now();
        let task = task(
            "development",
            TaskPriority::Medium,
            TaskContext::default().with_required_capabilities(&["code_generation"]),
        );

        let mut a = dev("a", &["code_generation"]);
        a.set_success_rate(0.9);
        let mut b = dev("b", &[]);
        b.set_success_rate(0.9);

        assert_eq!(AgentSelector::coverage(&a, &task), 1.0);
        assert_eq!(AgentSelector::coverage(&b, &task), 0.0);
        assert!(AgentSelector::score(&a, &task, now) > AgentSelector::score(&b, &task, now));

        let agents = [b, a];
        let selected = AgentSelector::new(0.8).select(agents.iter(), &task, now);
        assert_eq!(selected.map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn ties_go_to_registration_order() {
        let task = task("development", TaskPriority::Low, TaskContext::default());
        let agents = [dev("first", &[]), dev("second", &[])];

        let selected = AgentSelector::new(0.8).select(agents.iter(), &task, Utc::now());
        assert_eq!(selected.map(|a| a.id.as_str()), Some("first"));
    }

    #[test]
    fn coverage_below_half_is_ineligible() {
        let task = task(
            "development",
            TaskPriority::Low,
            TaskContext::default().with_required_capabilities(&["a", "b", "c"]),
        );
        let selector = AgentSelector::new(0.8);

        assert!(!selector.is_eligible(&dev("x", &["a"]), &task));
        assert!(selector.is_eligible(&dev("y", &["a", "b"]), &task));
    }

    #[test]
    fn busy_or_loaded_agents_are_ineligible() {
        let task = task("development", TaskPriority::Low, TaskContext::default());
        let selector = AgentSelector::new(0.8);

        let mut loaded = dev("loaded", &[]);
        loaded.set_load_factor(0.8);
        assert!(!selector.is_eligible(&loaded, &task));

        let mut busy = dev("busy", &[]);
        busy.assign(Uuid::new_v4()).unwrap();
        assert!(!selector.is_eligible(&busy, &task));

        assert_eq!(selector.select([&loaded, &busy], &task, Utc::now()), None);
    }

    #[test]
    fn type_table_applies_without_required_capabilities() {
        let research = task("research", TaskPriority::Low, TaskContext::default());
        let analyst = Agent::new("an", AgentType::Analysis, "An", &[], &[]);
        let creative = Agent::new("cr", AgentType::Creative, "Cr", &[], &[]);
        let coordinator = Agent::new("co", AgentType::Coordination, "Co", &[], &[]);

        assert!(AgentSelector::can_handle(&analyst, &research));
        assert!(!AgentSelector::can_handle(&creative, &research));
        assert!(AgentSelector::can_handle(&coordinator, &research));

        let unknown = task("gardening", TaskPriority::Low, TaskContext::default());
        assert!(!AgentSelector::can_handle(&analyst, &unknown));
        assert!(AgentSelector::can_handle(&coordinator, &unknown));
    }

    #[test]
    fn specialization_overlap_is_capped() {
        let now = Utc::now();
        let task = task(
            "development",
            TaskPriority::Low,
            TaskContext::default().with_specializations(&["rust", "go", "sql"]),
        );
        let plain = dev("plain", &[]);
        let expert = Agent::new("expert", AgentType::Development, "E", &[], &["rust", "go", "sql"]);

        let diff = AgentSelector::score(&expert, &task, now) - AgentSelector::score(&plain, &task, now);
        assert!((diff - 30.0).abs() < 1e-9);
    }

    #[test]
    fn recency_and_speed_bonuses() {
        let now = Utc::now();
        let urgent = task("development", TaskPriority::Critical, TaskContext::default());
        let routine = task("development", TaskPriority::Medium, TaskContext::default());

        let mut agent = dev("a", &[]);
        let base = AgentSelector::score(&agent, &urgent, now);

        agent.last_active = Some(now - Duration::minutes(30));
        agent.average_completion_secs = 600.0;
        let boosted = AgentSelector::score(&agent, &urgent, now);
        assert!((boosted - base - 15.0).abs() < 1e-9);

        let routine_score = AgentSelector::score(&agent, &routine, now);
        assert!((routine_score - base - 10.0).abs() < 1e-9);

        agent.last_active = Some(now - Duration::hours(2));
        assert!((AgentSelector::score(&agent, &routine, now) - base).abs() < 1e-9);
    }
}
