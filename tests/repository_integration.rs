//! Integration tests for repository layer
//!
//! These tests verify that the SQLite repositories round-trip every
//! aggregate, upsert on repeated saves and keep query ordering. Each test
//! runs against its own in-memory database.

use agent_coordinator::domain::agent::{Agent, AgentStatus, AgentType};
use agent_coordinator::domain::collaboration::{
    Collaboration, CollaborationPhase, CollaborationStatus, RoleAssignment, Subtask,
};
use agent_coordinator::domain::metrics::PerformanceMetric;
use agent_coordinator::domain::repositories::{
    AgentRepository, CollaborationRepository, MetricRepository, TaskRepository,
};
use agent_coordinator::domain::task::{NewTask, Task, TaskContext, TaskPriority, TaskStatus};
use agent_coordinator::infrastructure::repositories::{
    sqlite_store, SqliteAgentRepository, SqliteCollaborationRepository, SqliteMetricRepository,
    SqliteTaskRepository,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Set up a migrated single-connection in-memory database
async fn setup_test_db() -> SqlitePool {
    let pool = sqlite_store::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open test database");
    sqlite_store::migrate(&pool)
        .await
        .expect("Failed to apply schema");
    pool
}

#[tokio::test]
async fn test_agent_repository_round_trip_and_upsert() {
    let pool = setup_test_db().await;
    let repo = SqliteAgentRepository::new(pool);

    let mut agent = Agent::new(
        "data_analyst",
        AgentType::Analysis,
        "Data Analyst",
        &["data_processing", "visualization"],
        &["pandas"],
    )
    .with_description("Crunches numbers")
    .with_execution_hints(&["reasoning", "code"])
    .with_resource_requirements(&[("memory", "high")]);
    repo.save(&agent).await.expect("save agent");

    let task_id = Uuid::new_v4();
    agent.assign(task_id).unwrap();
    agent.total_tasks_completed = 7;
    agent.set_success_rate(0.75);
    agent.average_completion_secs = 42.5;
    repo.save(&agent).await.expect("update agent");

    let found = repo
        .find_by_id("data_analyst")
        .await
        .expect("query agent")
        .expect("agent exists");
    assert_eq!(found.agent_type, AgentType::Analysis);
    assert_eq!(found.description, "Crunches numbers");
    assert_eq!(found.capabilities, agent.capabilities);
    assert_eq!(found.specializations, agent.specializations);
    assert_eq!(found.current_task, Some(task_id));
    assert_eq!(found.status, AgentStatus::Assigned);
    assert_eq!(found.load_factor, agent.load_factor);
    assert_eq!(found.success_rate, 0.75);
    assert_eq!(found.total_tasks_completed, 7);
    assert_eq!(found.average_completion_secs, 42.5);
    assert_eq!(found.preferred_execution_hints, vec!["reasoning", "code"]);
    assert_eq!(found.resource_requirements["memory"], "high");

    assert_eq!(repo.find_all().await.unwrap().len(), 1);
    assert!(repo.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_agent_repository_keeps_insertion_order() {
    let pool = setup_test_db().await;
    let repo = SqliteAgentRepository::new(pool);

    for id in ["zeta", "alpha", "mid"] {
        repo.save(&Agent::new(id, AgentType::System, id, &[], &[]))
            .await
            .unwrap();
    }

    let ids: Vec<_> = repo
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn test_task_repository_round_trip_through_lifecycle() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool);

    let mut context = TaskContext::default()
        .with_required_capabilities(&["code_generation"])
        .with_specializations(&["python"])
        .with_estimated_subtasks(4);
    context.extra.insert("repository".to_string(), json!("api"));
    let deadline = Utc::now() + chrono::Duration::hours(2);
    let (mut task, _) = Task::new(
        NewTask::new("Build", "Build the endpoint", "development", TaskPriority::Critical)
            .with_context(context.clone())
            .with_estimated_duration(120.0)
            .with_deadline(deadline),
    )
    .unwrap();
    repo.save(&task).await.expect("save task");

    let pending = repo.find_by_id(task.id).await.unwrap().expect("task exists");
    assert_eq!(pending.status, TaskStatus::Pending);
    assert_eq!(pending.priority, TaskPriority::Critical);
    assert_eq!(pending.context, context);
    assert_eq!(pending.deadline, Some(deadline));
    assert_eq!(pending.estimated_duration_secs, 120.0);

    let now = Utc::now();
    task.assign("development_expert", now).unwrap();
    task.start(now).unwrap();
    task.complete(json!({"output": "done"}), now).unwrap();
    repo.save(&task).await.expect("update task");

    let done = repo.find_by_id(task.id).await.unwrap().expect("task exists");
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.assigned_agent.as_deref(), Some("development_expert"));
    assert_eq!(done.result, Some(json!({"output": "done"})));
    assert_eq!(done.started_at, Some(now));
    assert!(done.actual_duration_secs.is_some());
    assert_eq!(repo.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_task_repository_keeps_failure_details() {
    let pool = setup_test_db().await;
    let repo = SqliteTaskRepository::new(pool);

    let (mut task, _) =
        Task::new(NewTask::new("Scan", "Scan ports", "system", TaskPriority::Low)).unwrap();
    task.record_assignment_attempt(Utc::now());
    task.record_assignment_attempt(Utc::now());
    task.fail("No eligible agent after 2 assignment attempts", Utc::now())
        .unwrap();
    repo.save(&task).await.unwrap();

    let found = repo.find_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(found.status, TaskStatus::Failed);
    assert_eq!(found.assignment_attempts, 2);
    assert_eq!(
        found.error_message.as_deref(),
        Some("No eligible agent after 2 assignment attempts")
    );
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collaboration_repository_round_trip() {
    let pool = setup_test_db().await;
    let repo = SqliteCollaborationRepository::new(pool);
    let task_id = Uuid::new_v4();
    let now = Utc::now();

    let roles = vec![
        RoleAssignment {
            agent_id: "lead".to_string(),
            role: "coordinator".to_string(),
        },
        RoleAssignment {
            agent_id: "docs".to_string(),
            role: "communicator".to_string(),
        },
    ];
    let mut collaboration =
        Collaboration::form(task_id, "Collaboration for: Release", roles, now).unwrap();
    repo.save(&collaboration).await.expect("save collaboration");

    collaboration.record_decomposition(vec![Subtask::new("Write notes")], now);
    collaboration.complete(now).unwrap();
    repo.save(&collaboration).await.expect("update collaboration");

    let found = repo
        .find_by_task(task_id)
        .await
        .unwrap()
        .expect("collaboration exists");
    assert_eq!(found.id, collaboration.id);
    assert_eq!(found.status, CollaborationStatus::Completed);
    assert_eq!(found.primary_agent, "lead");
    assert_eq!(found.participating_agents, vec!["lead", "docs"]);
    assert_eq!(found.shared_context, collaboration.shared_context);
    let phases: Vec<_> = found.communication_log.iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        vec![
            CollaborationPhase::Formed,
            CollaborationPhase::Decomposed,
            CollaborationPhase::Completed
        ]
    );

    assert!(repo.find_by_id(collaboration.id).await.unwrap().is_some());
    assert!(repo.find_by_task(Uuid::new_v4()).await.unwrap().is_none());
    assert_eq!(repo.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_metric_repository_appends_per_agent() {
    let pool = setup_test_db().await;
    let repo = SqliteMetricRepository::new(pool);
    let now = Utc::now();

    let first = PerformanceMetric::task_completion(
        "r1",
        Uuid::new_v4(),
        true,
        json!({"duration_secs": 3.5}),
        now,
    );
    let second = PerformanceMetric::task_completion(
        "r1",
        Uuid::new_v4(),
        false,
        json!({}),
        now + chrono::Duration::seconds(1),
    );
    let other = PerformanceMetric::task_completion("r2", Uuid::new_v4(), true, json!({}), now);
    for metric in [&first, &second, &other] {
        repo.append(metric).await.expect("append metric");
    }
    // appending the same record twice is a no-op
    repo.append(&first).await.expect("append duplicate");

    let r1 = repo.find_by_agent("r1").await.unwrap();
    assert_eq!(r1.len(), 2);
    assert_eq!(r1[0].id, first.id);
    assert_eq!(r1[0].value, 1.0);
    assert_eq!(r1[0].context["duration_secs"], 3.5);
    assert_eq!(r1[1].value, 0.0);
    assert_eq!(repo.find_all().await.unwrap().len(), 3);
}
