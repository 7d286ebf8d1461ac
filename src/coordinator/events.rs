// Lifecycle event stream
//
// Every task transition, collaboration phase and agent release is published
// on a broadcast channel. Lagging or absent subscribers never block the
// coordinator.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::collaboration::CollaborationPhase;
use crate::domain::task::TaskEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    Task(TaskEvent),
    CollaborationPhase {
        collaboration_id: Uuid,
        task_id: Uuid,
        phase: CollaborationPhase,
    },
    AgentReleased {
        agent_id: String,
        task_id: Uuid,
    },
}

impl From<TaskEvent> for CoordinatorEvent {
    fn from(event: TaskEvent) -> Self {
        CoordinatorEvent::Task(event)
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoordinatorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: impl Into<CoordinatorEvent>) {
        // Err only means nobody is listening
        let _ = self.tx.send(event.into());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let task_id = Uuid::new_v4();

        bus.publish(TaskEvent::Completed { task_id });

        assert_eq!(
            rx.recv().await.unwrap(),
            CoordinatorEvent::Task(TaskEvent::Completed { task_id })
        );
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new(1);
        bus.publish(CoordinatorEvent::AgentReleased {
            agent_id: "a".to_string(),
            task_id: Uuid::nil(),
        });
    }
}
