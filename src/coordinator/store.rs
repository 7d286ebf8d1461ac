use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::collaboration::Collaboration;
use crate::domain::task::{Task, TaskStatus};

/// Owns task and collaboration records while the coordinator runs
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: HashMap<Uuid, Task>,
    collaborations: HashMap<Uuid, Collaboration>,
    collaboration_by_task: HashMap<Uuid, Uuid>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn count_with_status(&self, statuses: &[TaskStatus]) -> usize {
        self.tasks
            .values()
            .filter(|t| statuses.contains(&t.status))
            .count()
    }

    pub fn insert_collaboration(&mut self, collaboration: Collaboration) {
        self.collaboration_by_task
            .insert(collaboration.task_id, collaboration.id);
        self.collaborations.insert(collaboration.id, collaboration);
    }

    pub fn collaboration_mut(&mut self, id: Uuid) -> Option<&mut Collaboration> {
        self.collaborations.get_mut(&id)
    }

    /// Most recent collaboration formed for a task
    pub fn collaboration_for_task(&self, task_id: Uuid) -> Option<&Collaboration> {
        self.collaboration_by_task
            .get(&task_id)
            .and_then(|id| self.collaborations.get(id))
    }

    pub fn collaboration_for_task_mut(&mut self, task_id: Uuid) -> Option<&mut Collaboration> {
        let id = *self.collaboration_by_task.get(&task_id)?;
        self.collaborations.get_mut(&id)
    }

    pub fn active_collaborations(&self) -> usize {
        self.collaborations.values().filter(|c| c.is_active()).count()
    }
}
