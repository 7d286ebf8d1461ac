use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::agent::Agent;
use crate::domain::collaboration::Collaboration;
use crate::domain::metrics::PerformanceMetric;
use crate::domain::repositories::{
    AgentRepository, CollaborationRepository, MetricRepository, Repositories, TaskRepository,
};
use crate::domain::task::Task;

/// Process-local implementation of every repository port
///
/// Records keep insertion order. `set_fail_writes(true)` makes every write
/// return an error while reads keep working.
#[derive(Default)]
pub struct InMemoryRepository {
    agents: RwLock<Vec<Agent>>,
    tasks: RwLock<Vec<Task>>,
    collaborations: RwLock<Vec<Collaboration>>,
    metrics: RwLock<Vec<PerformanceMetric>>,
    fail_writes: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, what: &str) -> Result<(), String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(format!("Failed to save {}: storage unavailable", what));
        }
        Ok(())
    }
}

/// Bundles one shared in-memory store behind all four ports
pub fn in_memory_repositories(store: Arc<InMemoryRepository>) -> Repositories {
    Repositories {
        agents: store.clone(),
        tasks: store.clone(),
        collaborations: store.clone(),
        metrics: store,
    }
}

fn upsert<T: Clone>(records: &mut Vec<T>, record: &T, same: impl Fn(&T) -> bool) {
    match records.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
}

#[async_trait]
impl AgentRepository for InMemoryRepository {
    async fn save(&self, agent: &Agent) -> Result<(), String> {
        self.check_writable("agent")?;
        upsert(&mut *self.agents.write().await, agent, |a| a.id == agent.id);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Agent>, String> {
        Ok(self.agents.read().await.iter().find(|a| a.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Agent>, String> {
        Ok(self.agents.read().await.clone())
    }
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn save(&self, task: &Task) -> Result<(), String> {
        self.check_writable("task")?;
        upsert(&mut *self.tasks.write().await, task, |t| t.id == task.id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, String> {
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Task>, String> {
        Ok(self.tasks.read().await.clone())
    }
}

#[async_trait]
impl CollaborationRepository for InMemoryRepository {
    async fn save(&self, collaboration: &Collaboration) -> Result<(), String> {
        self.check_writable("collaboration")?;
        upsert(
            &mut *self.collaborations.write().await,
            collaboration,
            |c| c.id == collaboration.id,
        );
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Collaboration>, String> {
        Ok(self
            .collaborations
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_by_task(&self, task_id: Uuid) -> Result<Option<Collaboration>, String> {
        Ok(self
            .collaborations
            .read()
            .await
            .iter()
            .rev()
            .find(|c| c.task_id == task_id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Collaboration>, String> {
        Ok(self.collaborations.read().await.clone())
    }
}

#[async_trait]
impl MetricRepository for InMemoryRepository {
    async fn append(&self, metric: &PerformanceMetric) -> Result<(), String> {
        self.check_writable("metric")?;
        let mut metrics = self.metrics.write().await;
        if !metrics.iter().any(|m| m.id == metric.id) {
            metrics.push(metric.clone());
        }
        Ok(())
    }

    async fn find_by_agent(&self, agent_id: &str) -> Result<Vec<PerformanceMetric>, String> {
        Ok(self
            .metrics
            .read()
            .await
            .iter()
            .filter(|m| m.agent_id == agent_id)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<PerformanceMetric>, String> {
        Ok(self.metrics.read().await.clone())
    }
}
