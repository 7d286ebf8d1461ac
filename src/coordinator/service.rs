use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::decomposition::{ListItemParser, SubtaskParser};
use super::errors::{CoordinatorError, CoordinatorResult};
use super::events::{CoordinatorEvent, EventBus};
use super::execution::{ExecutionCapability, MemoryCapability};
use super::scheduler;
use super::selector::AgentSelector;
use super::state::CoordinatorState;
use crate::config::CoordinatorConfig;
use crate::domain::agent::{default_agents, Agent, AgentStatus};
use crate::domain::collaboration::{Collaboration, CollaborationPhase};
use crate::domain::metrics::PerformanceMetric;
use crate::domain::repositories::Repositories;
use crate::domain::task::{NewTask, Task, TaskStatus};

const RESTART_REASON: &str = "Interrupted by coordinator restart";

/// Shared internals of a [`Coordinator`]
pub(crate) struct Core {
    pub config: CoordinatorConfig,
    pub state: Mutex<CoordinatorState>,
    pub repos: Repositories,
    pub executor: Arc<dyn ExecutionCapability>,
    pub memory: Option<Arc<dyn MemoryCapability>>,
    pub parser: Arc<dyn SubtaskParser>,
    pub selector: AgentSelector,
    pub events: EventBus,
}

impl Core {
    pub async fn save_task(&self, task: &Task) {
        if let Err(e) = self.repos.tasks.save(task).await {
            let error = CoordinatorError::Persistence(e);
            tracing::error!(task_id = %task.id, error = %error, "failed to persist task");
        }
    }

    pub async fn save_agent(&self, agent: &Agent) {
        if let Err(e) = self.repos.agents.save(agent).await {
            let error = CoordinatorError::Persistence(e);
            tracing::error!(agent_id = %agent.id, error = %error, "failed to persist agent");
        }
    }

    pub async fn save_collaboration(&self, collaboration: &Collaboration) {
        if let Err(e) = self.repos.collaborations.save(collaboration).await {
            let error = CoordinatorError::Persistence(e);
            tracing::error!(
                collaboration_id = %collaboration.id,
                error = %error,
                "failed to persist collaboration"
            );
        }
    }

    pub async fn append_metric(&self, metric: &PerformanceMetric) {
        if let Err(e) = self.repos.metrics.append(metric).await {
            let error = CoordinatorError::Persistence(e);
            tracing::error!(agent_id = %metric.agent_id, error = %error, "failed to persist metric");
        }
    }

    pub fn publish_phase(&self, collaboration: &Collaboration, phase: CollaborationPhase) {
        self.events.publish(CoordinatorEvent::CollaborationPhase {
            collaboration_id: collaboration.id,
            task_id: collaboration.task_id,
            phase,
        });
    }
}

/// Snapshot returned by [`Coordinator::task_status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub assigned_agent: Option<String>,
    pub progress_percent: f64,
    pub result: Option<Value>,
    pub error_message: Option<String>,
}

/// Snapshot returned by [`Coordinator::system_status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub total_agents: usize,
    pub active_agents: usize,
    pub pending_tasks: usize,
    pub active_tasks: usize,
    pub active_collaborations: usize,
    pub mean_load_factor: f64,
}

/// Handle to the running dispatch loop
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the loop and waits for it to exit
    ///
    /// Execution units already spawned keep running to completion.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            tracing::error!(error = %e, "scheduler loop ended abnormally");
        }
    }
}

/// The coordination engine
///
/// Cheap to clone; every clone drives the same state.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use agent_coordinator::config::CoordinatorConfig;
/// use agent_coordinator::coordinator::Coordinator;
/// use agent_coordinator::domain::task::{NewTask, TaskPriority};
/// use agent_coordinator::infrastructure::execution::EchoExecutor;
/// use agent_coordinator::infrastructure::repositories::{in_memory_repositories, InMemoryRepository};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let coordinator = Coordinator::new(
///     CoordinatorConfig::default(),
///     in_memory_repositories(Arc::new(InMemoryRepository::new())),
///     Arc::new(EchoExecutor::new()),
///     None,
/// )?;
/// coordinator.initialize().await?;
/// let scheduler = coordinator.start();
///
/// let task_id = coordinator
///     .submit_task(NewTask::new("Check disk", "Check free disk space", "system", TaskPriority::High))
///     .await?;
/// println!("{:?}", coordinator.task_status(task_id).await?);
///
/// scheduler.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Coordinator {
    core: Arc<Core>,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        repos: Repositories,
        executor: Arc<dyn ExecutionCapability>,
        memory: Option<Arc<dyn MemoryCapability>>,
    ) -> CoordinatorResult<Self> {
        Self::with_parser(config, repos, executor, memory, Arc::new(ListItemParser))
    }

    /// Same as [`Coordinator::new`] with a custom decomposition parser
    ///
    /// Fails when `config` does not pass [`CoordinatorConfig::validate`].
    pub fn with_parser(
        config: CoordinatorConfig,
        repos: Repositories,
        executor: Arc<dyn ExecutionCapability>,
        memory: Option<Arc<dyn MemoryCapability>>,
        parser: Arc<dyn SubtaskParser>,
    ) -> CoordinatorResult<Self> {
        config
            .validate()
            .map_err(|e| CoordinatorError::ConfigError(e.to_string()))?;

        let core = Core {
            selector: AgentSelector::new(config.load_balance_threshold),
            events: EventBus::new(config.event_capacity),
            state: Mutex::new(CoordinatorState::new()),
            config,
            repos,
            executor,
            memory,
            parser,
        };

        Ok(Self {
            core: Arc::new(core),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.core.config
    }

    /// Registers the default agent catalog and recovers persisted state
    pub async fn initialize(&self) -> CoordinatorResult<()> {
        self.initialize_with(default_agents()).await
    }

    /// Registers `agents` and recovers persisted state
    ///
    /// Persisted statistics of known agents are kept while their runtime state
    /// is reset. Pending tasks are queued again. Tasks and collaborations that
    /// were mid-flight when the previous process stopped are failed.
    pub async fn initialize_with(&self, agents: Vec<Agent>) -> CoordinatorResult<()> {
        let core = &self.core;
        let persisted_agents = core
            .repos
            .agents
            .find_all()
            .await
            .map_err(CoordinatorError::Persistence)?;
        let persisted_tasks = core
            .repos
            .tasks
            .find_all()
            .await
            .map_err(CoordinatorError::Persistence)?;
        let persisted_collaborations = core
            .repos
            .collaborations
            .find_all()
            .await
            .map_err(CoordinatorError::Persistence)?;

        let mut guard = core.state.lock().await;
        let state = &mut *guard;
        let now = Utc::now();

        for mut agent in agents {
            if let Some(saved) = persisted_agents.iter().find(|a| a.id == agent.id) {
                agent.set_success_rate(saved.success_rate);
                agent.total_tasks_completed = saved.total_tasks_completed;
                agent.average_completion_secs = saved.average_completion_secs;
                agent.last_active = saved.last_active;
            }
            agent.status = AgentStatus::Idle;
            agent.current_task = None;
            agent.set_load_factor(0.0);

            core.save_agent(&agent).await;
            state.registry.register(agent);
        }

        let mut requeued = 0;
        let mut interrupted = 0;
        for mut task in persisted_tasks {
            match task.status {
                TaskStatus::Pending => {
                    state.queues.push(task.priority, task.id);
                    requeued += 1;
                }
                TaskStatus::Assigned | TaskStatus::InProgress => {
                    if let Ok(event) = task.fail(RESTART_REASON, now) {
                        core.save_task(&task).await;
                        core.events.publish(event);
                        interrupted += 1;
                    }
                }
                _ => {}
            }
            state.store.insert_task(task);
        }

        for mut collaboration in persisted_collaborations {
            if collaboration.is_active() && collaboration.fail(RESTART_REASON, now).is_ok() {
                core.save_collaboration(&collaboration).await;
            }
            state.store.insert_collaboration(collaboration);
        }

        tracing::info!(
            agents = state.registry.len(),
            requeued,
            interrupted,
            "coordinator initialized"
        );
        Ok(())
    }

    /// Spawns the dispatch loop
    pub fn start(&self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let join = tokio::spawn(scheduler::run(Arc::clone(&self.core), rx));
        SchedulerHandle { shutdown, join }
    }

    /// Validates, persists and queues a task
    pub async fn submit_task(&self, input: NewTask) -> CoordinatorResult<Uuid> {
        let (task, event) = Task::new(input).map_err(CoordinatorError::InvalidTask)?;
        let task_id = task.id;

        let mut state = self.core.state.lock().await;
        self.core.save_task(&task).await;
        state.queues.push(task.priority, task_id);
        tracing::info!(%task_id, priority = %task.priority, task_type = %task.task_type, "task submitted");
        state.store.insert_task(task);
        self.core.events.publish(event);

        Ok(task_id)
    }

    pub async fn task_status(&self, task_id: Uuid) -> CoordinatorResult<TaskStatusReport> {
        let state = self.core.state.lock().await;
        let task = state
            .store
            .task(task_id)
            .ok_or(CoordinatorError::TaskNotFound(task_id))?;

        Ok(TaskStatusReport {
            task_id,
            status: task.status,
            assigned_agent: task.assigned_agent.clone(),
            progress_percent: task.progress_at(Utc::now()),
            result: task.result.clone(),
            error_message: task.error_message.clone(),
        })
    }

    pub async fn system_status(&self) -> SystemStatus {
        let state = self.core.state.lock().await;

        SystemStatus {
            total_agents: state.registry.len(),
            active_agents: state
                .registry
                .iter()
                .filter(|a| a.status != AgentStatus::Idle)
                .count(),
            pending_tasks: state.store.count_with_status(&[TaskStatus::Pending]),
            active_tasks: state.store.count_with_status(&[TaskStatus::InProgress]),
            active_collaborations: state.store.active_collaborations(),
            mean_load_factor: state.registry.mean_load_factor(),
        }
    }

    /// Cancels a task that has not finished
    ///
    /// A running execution is not interrupted; its outcome is discarded and
    /// its agents are released when it returns.
    pub async fn cancel_task(&self, task_id: Uuid) -> CoordinatorResult<()> {
        let mut guard = self.core.state.lock().await;
        let state = &mut *guard;
        let now = Utc::now();

        let task = state
            .store
            .task_mut(task_id)
            .ok_or(CoordinatorError::TaskNotFound(task_id))?;
        let from = task.status;
        let event = task
            .cancel(now)
            .map_err(|_| CoordinatorError::InvalidStateTransition {
                from: from.to_string(),
                to: TaskStatus::Cancelled.to_string(),
            })?;
        self.core.save_task(task).await;
        self.core.events.publish(event);
        tracing::info!(%task_id, from = %from, "task cancelled");

        if !state.running.contains(&task_id) {
            scheduler::release_orphaned(&self.core, state, task_id, "Task cancelled").await;
        }
        Ok(())
    }

    /// Every registered agent, in registration order
    pub async fn agents(&self) -> Vec<Agent> {
        self.core.state.lock().await.registry.iter().cloned().collect()
    }

    pub async fn agent(&self, agent_id: &str) -> CoordinatorResult<Agent> {
        self.core
            .state
            .lock()
            .await
            .registry
            .get(agent_id)
            .cloned()
            .ok_or_else(|| CoordinatorError::AgentNotFound(agent_id.to_string()))
    }

    pub async fn task(&self, task_id: Uuid) -> Option<Task> {
        self.core.state.lock().await.store.task(task_id).cloned()
    }

    pub async fn collaboration_for_task(&self, task_id: Uuid) -> Option<Collaboration> {
        self.core
            .state
            .lock()
            .await
            .store
            .collaboration_for_task(task_id)
            .cloned()
    }

    /// Metrics recorded for one agent, oldest first
    pub async fn performance_metrics(&self, agent_id: &str) -> CoordinatorResult<Vec<PerformanceMetric>> {
        self.core
            .repos
            .metrics
            .find_by_agent(agent_id)
            .await
            .map_err(CoordinatorError::Persistence)
    }

    /// Lifecycle events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.core.events.subscribe()
    }

    /// Runs one dispatch pass immediately
    pub async fn dispatch_once(&self) {
        scheduler::dispatch_tick(&self.core).await;
    }

    /// Runs the timeout reaper and load rebalancing immediately
    pub async fn run_maintenance(&self) {
        scheduler::maintenance(&self.core).await;
    }
}
