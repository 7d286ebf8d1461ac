// Execution unit
//
// One spawned task per assigned coordination task. It moves the task into
// `in_progress`, runs the simple or collaborative path with the coordination
// lock released, and always finishes through `finish_execution`, whatever
// the outcome (success, failure, timeout or panic).

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::errors::{CoordinatorError, CoordinatorResult};
use super::events::CoordinatorEvent;
use super::execution::ExecutionRequest;
use super::orchestrator::{CollaborationOrchestrator, CollaborationPlan};
use super::performance::PerformanceTracker;
use super::service::Core;
use crate::domain::agent::Agent;
use crate::domain::collaboration::CollaborationPhase;
use crate::domain::task::{Task, TaskStatus};

/// What `begin_execution` decided to run
enum ExecutionPlan {
    Simple { task: Task, agent: Agent },
    Collaborative(CollaborationPlan),
}

impl ExecutionPlan {
    fn is_collaborative(&self) -> bool {
        matches!(self, ExecutionPlan::Collaborative(_))
    }
}

pub(crate) async fn run_task(core: Arc<Core>, task_id: Uuid, agent_id: String) {
    let Some(plan) = begin_execution(&core, task_id, &agent_id).await else {
        return;
    };

    let timeout = core.config.timeout_for(plan.is_collaborative());
    let work = async {
        match plan {
            ExecutionPlan::Simple { task, agent } => execute_simple(&core, &task, &agent).await,
            ExecutionPlan::Collaborative(plan) => {
                CollaborationOrchestrator::new(&core).execute(plan).await
            }
        }
    };

    let outcome = match tokio::time::timeout(timeout, AssertUnwindSafe(work).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => Err(CoordinatorError::ExecutionFailed(format!(
            "execution panicked: {}",
            panic_message(panic.as_ref())
        ))),
        Err(_) => Err(CoordinatorError::TimedOut(timeout)),
    };

    finish_execution(&core, task_id, outcome).await;
}

/// Moves the task and its agent into execution and forms a collaboration
/// when the task calls for one
///
/// Returns `None` when the task left `assigned` before the unit started.
async fn begin_execution(core: &Arc<Core>, task_id: Uuid, agent_id: &str) -> Option<ExecutionPlan> {
    let mut guard = core.state.lock().await;
    let state = &mut *guard;
    let now = Utc::now();

    let started = match (state.store.task_mut(task_id), state.registry.get_mut(agent_id)) {
        (Some(task), Some(agent)) => match task.start(now) {
            Ok(event) => {
                if let Err(e) = agent.start_working(now) {
                    tracing::warn!(%task_id, agent_id, error = %e, "agent state out of step");
                }
                core.save_task(task).await;
                core.save_agent(agent).await;
                core.events.publish(event);
                tracing::info!(%task_id, agent_id, "task started");
                Some((task.clone(), agent.clone()))
            }
            Err(e) => {
                tracing::info!(%task_id, error = %e, "task no longer runnable");
                None
            }
        },
        _ => None,
    };

    let Some((task, agent)) = started else {
        state.running.remove(&task_id);
        super::scheduler::release_orphaned(core, state, task_id, "Task no longer runnable").await;
        return None;
    };

    if !CollaborationOrchestrator::requires_collaboration(&task) {
        return Some(ExecutionPlan::Simple { task, agent });
    }

    match CollaborationOrchestrator::form(core, state, &task, &agent, now).await {
        Ok(plan) => Some(ExecutionPlan::Collaborative(plan)),
        Err(e) => {
            tracing::error!(%task_id, error = %e, "could not form collaboration, running alone");
            Some(ExecutionPlan::Simple { task, agent })
        }
    }
}

/// Context handed to the execution capability: the task's own context plus
/// who is running it
pub(crate) fn enriched_context(task: &Task, agent: &Agent) -> Map<String, Value> {
    let mut context = task.context.to_map();
    context.insert("task_id".to_string(), json!(task.id));
    context.insert("task_title".to_string(), json!(task.title));
    context.insert("task_type".to_string(), json!(task.task_type));
    context.insert("agent_id".to_string(), json!(agent.id));
    context.insert("agent_capabilities".to_string(), json!(agent.capabilities));
    context.insert("agent_specializations".to_string(), json!(agent.specializations));
    context
}

async fn execute_simple(core: &Core, task: &Task, agent: &Agent) -> CoordinatorResult<Value> {
    let request = ExecutionRequest::new(task.description.clone(), agent.execution_hint())
        .with_context(enriched_context(task, agent));

    let output = core
        .executor
        .execute(request)
        .await
        .map_err(|e| CoordinatorError::ExecutionFailed(e.to_string()))?;

    Ok(json!({
        "output": output,
        "agent_id": agent.id,
        "execution_type": "single_agent",
    }))
}

/// Records performance, releases every agent bound to the task and applies
/// the terminal transition, all in one critical section
async fn finish_execution(core: &Arc<Core>, task_id: Uuid, outcome: CoordinatorResult<Value>) {
    let mut guard = core.state.lock().await;
    let state = &mut *guard;
    let now = Utc::now();
    let success = outcome.is_ok();
    state.running.remove(&task_id);

    let Some(task) = state.store.task_mut(task_id) else {
        tracing::error!(%task_id, "finished task missing from store");
        return;
    };
    let duration = task.elapsed_since_start(now).unwrap_or(0.0);
    let primary = task.assigned_agent.clone();
    // cancelled or reaped while running; the outcome no longer counts
    let discarded = task.status.is_terminal();

    for agent in state.registry.iter_mut().filter(|a| a.is_bound_to(task_id)) {
        if !discarded && primary.as_deref() == Some(agent.id.as_str()) {
            let metric = PerformanceTracker::record_outcome(agent, task, success, duration, now);
            core.append_metric(&metric).await;
        }
        agent.release();
        core.save_agent(agent).await;
        core.events.publish(CoordinatorEvent::AgentReleased {
            agent_id: agent.id.clone(),
            task_id,
        });
    }

    let error_message = if discarded {
        tracing::debug!(%task_id, status = %task.status, "discarding late outcome");
        Some(terminal_reason(task))
    } else {
        let error_message = outcome.as_ref().err().map(ToString::to_string);
        let transition = match outcome {
            Ok(result) => task.complete(result, now),
            Err(e) => task.fail(e.to_string(), now),
        };
        match transition {
            Ok(event) => {
                match &error_message {
                    None => tracing::info!(%task_id, duration_secs = duration, "task completed"),
                    Some(error) => tracing::error!(%task_id, error = %error, "task failed"),
                }
                core.save_task(task).await;
                core.events.publish(event);
            }
            Err(e) => tracing::error!(%task_id, error = %e, "terminal transition rejected"),
        }
        error_message
    };

    let task = task.clone();
    if let Some(collaboration) = state.store.collaboration_for_task_mut(task_id) {
        if collaboration.is_active() {
            let (closed, phase) = match &error_message {
                None => (collaboration.complete(now), CollaborationPhase::Completed),
                Some(reason) => (collaboration.fail(reason, now), CollaborationPhase::Failed),
            };
            if closed.is_ok() {
                core.save_collaboration(collaboration).await;
                core.publish_phase(collaboration, phase);
            }
        }
    }
    drop(guard);

    if !discarded {
        record_memory(core, &task, success, duration);
    }
}

/// Why a task ended before its execution unit returned
fn terminal_reason(task: &Task) -> String {
    match (task.status, &task.error_message) {
        (TaskStatus::Cancelled, _) => "Task cancelled".to_string(),
        (_, Some(message)) => message.clone(),
        (status, None) => format!("Task {}", status),
    }
}

/// Fire-and-forget record of the outcome in the memory capability
fn record_memory(core: &Core, task: &Task, success: bool, duration_secs: f64) {
    let Some(memory) = core.memory.clone() else {
        return;
    };

    let payload = json!({
        "task_id": task.id,
        "title": task.title,
        "agent_id": task.assigned_agent,
        "success": success,
        "duration_secs": duration_secs,
        "priority": task.priority,
        "status": task.status,
    });
    let task_id = task.id;

    tokio::spawn(async move {
        if let Err(e) = memory.record("task_completion", payload).await {
            tracing::warn!(%task_id, error = %e, "memory record failed");
        }
    });
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentType;
    use crate::domain::task::{NewTask, TaskContext, TaskPriority};

    #[test]
    fn context_keeps_caller_keys_and_adds_agent() {
        let mut context = TaskContext::default().with_required_capabilities(&["web_search"]);
        context.extra.insert("repository".to_string(), json!("r"));
        let (task, _) = Task::new(
            NewTask::new("T", "D", "research", TaskPriority::Low).with_context(context),
        )
        .unwrap();
        let agent = Agent::new("a", AgentType::Research, "A", &["web_search"], &["papers"]);

        let enriched = enriched_context(&task, &agent);

        assert_eq!(enriched["repository"], json!("r"));
        assert_eq!(enriched["required_capabilities"], json!(["web_search"]));
        assert_eq!(enriched["agent_id"], json!("a"));
        assert_eq!(enriched["agent_specializations"], json!(["papers"]));
        assert_eq!(enriched["task_id"], json!(task.id));
    }

    #[test]
    fn terminal_reason_names_cancellation_or_failure() {
        let now = Utc::now();
        let (mut cancelled, _) =
            Task::new(NewTask::new("T", "D", "research", TaskPriority::Low)).unwrap();
        cancelled.cancel(now).unwrap();
        let (mut reaped, _) =
            Task::new(NewTask::new("T", "D", "research", TaskPriority::Low)).unwrap();
        reaped.fail("Task timed out after 5s", now).unwrap();

        assert_eq!(terminal_reason(&cancelled), "Task cancelled");
        assert_eq!(terminal_reason(&reaped), "Task timed out after 5s");
    }

    #[test]
    fn panic_payloads_become_text() {
        let from_str: Box<dyn Any + Send> = Box::new("boom");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7);

        assert_eq!(panic_message(from_str.as_ref()), "boom");
        assert_eq!(panic_message(from_string.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
