use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::events::CoordinatorEvent;
use super::service::Core;
use super::state::CoordinatorState;
use super::worker;
use crate::domain::agent::AgentStatus;
use crate::domain::collaboration::CollaborationPhase;
use crate::domain::task::{TaskPriority, TaskStatus};

/// One FIFO queue of task ids per priority
#[derive(Debug, Default)]
pub struct PriorityQueues {
    queues: BTreeMap<TaskPriority, VecDeque<Uuid>>,
}

impl PriorityQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, priority: TaskPriority, task_id: Uuid) {
        self.queues.entry(priority).or_default().push_back(task_id);
    }

    pub fn pop(&mut self, priority: TaskPriority) -> Option<Uuid> {
        self.queues.get_mut(&priority)?.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dispatch loop: one pass per tick, maintenance on its own interval
pub(crate) async fn run(core: Arc<Core>, mut shutdown: watch::Receiver<bool>) {
    let mut tick = tokio::time::interval(core.config.scheduler_tick);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut maintenance_tick = tokio::time::interval(core.config.maintenance_interval);
    maintenance_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        tick_ms = core.config.scheduler_tick.as_millis() as u64,
        "scheduler started"
    );

    loop {
        tokio::select! {
            _ = tick.tick() => dispatch_tick(&core).await,
            _ = maintenance_tick.tick() => maintenance(&core).await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("scheduler stopped");
}

/// Scans priorities from emergency to low, taking one task from each
/// non-empty queue and trying to assign it
pub(crate) async fn dispatch_tick(core: &Arc<Core>) {
    let mut guard = core.state.lock().await;
    let state = &mut *guard;

    for priority in TaskPriority::DESCENDING {
        if let Some(task_id) = state.queues.pop(priority) {
            try_assign(core, state, task_id).await;
        }
    }
}

async fn try_assign(core: &Arc<Core>, state: &mut CoordinatorState, task_id: Uuid) {
    let now = Utc::now();
    let Some(task) = state.store.task_mut(task_id) else {
        return;
    };
    // cancelled or failed while queued
    if task.status != TaskStatus::Pending {
        return;
    }

    let selected = core
        .selector
        .select(state.registry.iter(), task, now)
        .map(|agent| agent.id.clone());

    let Some(agent_id) = selected else {
        let attempts = task.record_assignment_attempt(now);

        if core.config.attempts_exhausted(attempts) {
            let reason = format!("No eligible agent after {} assignment attempts", attempts);
            if let Ok(event) = task.fail(reason, now) {
                tracing::warn!(%task_id, attempts, "giving up on task assignment");
                core.save_task(task).await;
                core.events.publish(event);
            }
            return;
        }

        let delay = core.config.backoff_for(attempts);
        tracing::warn!(
            %task_id,
            attempts,
            backoff_secs = delay.as_secs_f64(),
            "no eligible agent, requeueing"
        );
        core.save_task(task).await;
        schedule_requeue(core, task_id, task.priority, delay);
        return;
    };

    let Some(agent) = state.registry.get_mut(&agent_id) else {
        return;
    };
    if let Err(e) = agent.assign(task_id) {
        tracing::error!(%task_id, agent_id = %agent_id, error = %e, "agent refused assignment");
        state.queues.push(task.priority, task_id);
        return;
    }
    let event = match task.assign(&agent_id, now) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(%task_id, error = %e, "task refused assignment");
            agent.release();
            return;
        }
    };

    core.save_agent(agent).await;
    core.save_task(task).await;
    core.events.publish(event);
    tracing::info!(%task_id, agent_id = %agent_id, priority = %task.priority, "task assigned");

    state.running.insert(task_id);
    tokio::spawn(worker::run_task(Arc::clone(core), task_id, agent_id));
}

/// Puts a task back in its queue after `delay`, unless it left `pending`
fn schedule_requeue(core: &Arc<Core>, task_id: Uuid, priority: TaskPriority, delay: Duration) {
    let core = Arc::clone(core);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let mut state = core.state.lock().await;
        let still_pending = state
            .store
            .task(task_id)
            .is_some_and(|t| t.status == TaskStatus::Pending);
        if still_pending {
            state.queues.push(priority, task_id);
        }
    });
}

/// Timeout reaper followed by load rebalancing
pub(crate) async fn maintenance(core: &Arc<Core>) {
    let mut guard = core.state.lock().await;
    let state = &mut *guard;
    let now = Utc::now();

    let overdue: Vec<(Uuid, String)> = state
        .store
        .tasks()
        .filter_map(|task| {
            let collaborative = state.store.collaboration_for_task(task.id).is_some();
            let timeout = core.config.timeout_for(collaborative);
            if task.has_exceeded(timeout, now) {
                Some((task.id, format!("Execution timed out after {:?}", timeout)))
            } else if task.is_past_deadline(now) {
                Some((task.id, "Deadline exceeded".to_string()))
            } else {
                None
            }
        })
        .collect();

    for (task_id, reason) in overdue {
        let Some(task) = state.store.task_mut(task_id) else {
            continue;
        };
        if let Ok(event) = task.fail(reason.clone(), now) {
            tracing::warn!(%task_id, reason = %reason, "task reaped");
            core.save_task(task).await;
            core.events.publish(event);
        }
        if !state.running.contains(&task_id) {
            release_orphaned(core, state, task_id, &reason).await;
        }
    }

    for agent in state.registry.iter_mut() {
        if agent.status == AgentStatus::Idle && agent.current_task.is_none() && agent.load_factor > 0.0 {
            agent.set_load_factor(0.0);
            tracing::debug!(agent_id = %agent.id, "load factor reset");
            core.save_agent(agent).await;
        }
    }
}

/// Releases agents and closes the collaboration of a task no execution unit
/// will finish
pub(crate) async fn release_orphaned(
    core: &Core,
    state: &mut CoordinatorState,
    task_id: Uuid,
    reason: &str,
) {
    let now = Utc::now();

    for agent in state.registry.iter_mut().filter(|a| a.is_bound_to(task_id)) {
        agent.release();
        core.save_agent(agent).await;
        core.events.publish(CoordinatorEvent::AgentReleased {
            agent_id: agent.id.clone(),
            task_id,
        });
    }

    if let Some(collaboration) = state.store.collaboration_for_task_mut(task_id) {
        if collaboration.is_active() && collaboration.fail(reason, now).is_ok() {
            core.save_collaboration(collaboration).await;
            core.publish_phase(collaboration, CollaborationPhase::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queues_are_fifo_per_priority() {
        let mut queues = PriorityQueues::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        queues.push(TaskPriority::Low, a);
        queues.push(TaskPriority::Low, b);
        queues.push(TaskPriority::Emergency, c);

        assert_eq!(queues.len(), 3);
        assert_eq!(queues.pop(TaskPriority::Emergency), Some(c));
        assert_eq!(queues.pop(TaskPriority::Emergency), None);
        assert_eq!(queues.pop(TaskPriority::Low), Some(a));
        assert_eq!(queues.pop(TaskPriority::Low), Some(b));
        assert!(queues.is_empty());
    }
}
