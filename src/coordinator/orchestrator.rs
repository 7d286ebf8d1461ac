use std::collections::{BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::decomposition::fit_to_helpers;
use super::errors::{CoordinatorError, CoordinatorResult};
use super::execution::{output_text, ExecutionRequest, REASONING_HINT};
use super::prompts::library;
use super::registry::AgentRegistry;
use super::service::Core;
use super::state::CoordinatorState;
use super::worker::{enriched_context, panic_message};
use crate::domain::agent::Agent;
use crate::domain::collaboration::{
    Collaboration, CollaborationPhase, RoleAssignment, Subtask, COORDINATOR_ROLE,
};
use crate::domain::task::{Task, TaskPriority};

/// Descriptions longer than this count as one complexity indicator
const LONG_DESCRIPTION_CHARS: usize = 500;
const MANY_SUBTASKS: u32 = 3;
const MANY_CAPABILITIES: usize = 3;
const MIN_COMPLEXITY_INDICATORS: usize = 2;
const COLLABORATION_KEYWORD: &str = "collaboration";

/// Outcome of one helper's subtask; failures are values, never errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubtaskResult {
    Succeeded {
        agent_id: String,
        subtask: Subtask,
        result: Value,
    },
    Failed {
        agent_id: String,
        subtask: Subtask,
        error: String,
    },
}

impl SubtaskResult {
    pub fn agent_id(&self) -> &str {
        match self {
            SubtaskResult::Succeeded { agent_id, .. } | SubtaskResult::Failed { agent_id, .. } => {
                agent_id
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubtaskResult::Succeeded { .. })
    }

    fn summary(&self) -> String {
        match self {
            SubtaskResult::Succeeded {
                agent_id,
                subtask,
                result,
            } => format!("- {} ({}): {}", agent_id, subtask.description, output_text(result)),
            SubtaskResult::Failed {
                agent_id,
                subtask,
                error,
            } => format!("- {} ({}): FAILED: {}", agent_id, subtask.description, error),
        }
    }
}

/// Everything a formed collaboration needs once the lock is released
#[derive(Debug, Clone)]
pub struct CollaborationPlan {
    pub collaboration_id: Uuid,
    pub task: Task,
    pub primary: Agent,
    pub helpers: Vec<Agent>,
    pub roles: Vec<RoleAssignment>,
}

/// Runs the hierarchical decompose / execute / integrate protocol
pub struct CollaborationOrchestrator<'a> {
    core: &'a Core,
}

impl<'a> CollaborationOrchestrator<'a> {
    pub(crate) fn new(core: &'a Core) -> Self {
        Self { core }
    }

    /// Whether a task shows enough complexity indicators to need a team
    pub fn requires_collaboration(task: &Task) -> bool {
        let indicators = [
            task.description.chars().count() > LONG_DESCRIPTION_CHARS,
            task.context.estimated_subtasks > MANY_SUBTASKS,
            task.context.required_capabilities.len() > MANY_CAPABILITIES,
            matches!(task.priority, TaskPriority::High | TaskPriority::Critical),
            task.description
                .to_lowercase()
                .contains(COLLABORATION_KEYWORD),
        ];

        indicators.iter().filter(|hit| **hit).count() >= MIN_COMPLEXITY_INDICATORS
    }

    /// Helpers covering what the primary agent lacks, greedily in registry order
    pub fn select_collaborators(
        registry: &AgentRegistry,
        primary: &Agent,
        task: &Task,
        load_balance_threshold: f64,
        max_agents_per_task: usize,
    ) -> Vec<String> {
        let mut missing: BTreeSet<&String> = task
            .context
            .required_capabilities
            .iter()
            .filter(|c| !primary.capabilities.contains(*c))
            .collect();
        let max_helpers = max_agents_per_task.saturating_sub(1);
        let mut helpers = Vec::new();

        for agent in registry.iter() {
            if missing.is_empty() || helpers.len() >= max_helpers {
                break;
            }
            if agent.id == primary.id || !agent.is_available(load_balance_threshold) {
                continue;
            }
            let before = missing.len();
            missing.retain(|c| !agent.capabilities.contains(*c));
            if missing.len() < before {
                helpers.push(agent.id.clone());
            }
        }

        helpers
    }

    /// Primary coordinates; helpers take the role of their agent type
    pub fn assign_roles(primary: &Agent, helpers: &[Agent]) -> Vec<RoleAssignment> {
        std::iter::once(RoleAssignment {
            agent_id: primary.id.clone(),
            role: COORDINATOR_ROLE.to_string(),
        })
        .chain(helpers.iter().map(|helper| RoleAssignment {
            agent_id: helper.id.clone(),
            role: helper.agent_type.collaboration_role().to_string(),
        }))
        .collect()
    }

    /// Reserves helpers and records the new collaboration
    ///
    /// Runs inside the coordination lock so no helper can be handed another
    /// task before the collaboration releases it.
    pub(crate) async fn form(
        core: &Core,
        state: &mut CoordinatorState,
        task: &Task,
        primary: &Agent,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<CollaborationPlan> {
        let helper_ids = Self::select_collaborators(
            &state.registry,
            primary,
            task,
            core.config.load_balance_threshold,
            core.config.max_agents_per_task,
        );

        let mut helpers = Vec::with_capacity(helper_ids.len());
        for helper_id in helper_ids {
            let Some(helper) = state.registry.get_mut(&helper_id) else {
                continue;
            };
            if let Err(e) = helper.assign(task.id) {
                tracing::warn!(task_id = %task.id, agent_id = %helper_id, error = %e, "helper unavailable");
                continue;
            }
            helper
                .start_working(now)
                .map_err(CoordinatorError::ExecutionFailed)?;
            core.save_agent(helper).await;
            helpers.push(helper.clone());
        }

        let roles = Self::assign_roles(primary, &helpers);
        let collaboration = Collaboration::form(
            task.id,
            format!("Collaboration for: {}", task.title),
            roles.clone(),
            now,
        )
        .map_err(CoordinatorError::ExecutionFailed)?;
        let collaboration_id = collaboration.id;

        core.save_collaboration(&collaboration).await;
        core.publish_phase(&collaboration, CollaborationPhase::Formed);
        tracing::info!(
            task_id = %task.id,
            collaboration_id = %collaboration_id,
            helpers = helpers.len(),
            "collaboration formed"
        );
        state.store.insert_collaboration(collaboration);

        Ok(CollaborationPlan {
            collaboration_id,
            task: task.clone(),
            primary: primary.clone(),
            helpers,
            roles,
        })
    }

    /// Decomposes, fans out to helpers, then integrates
    pub(crate) async fn execute(&self, plan: CollaborationPlan) -> CoordinatorResult<Value> {
        let subtasks = self.decompose(&plan).await?;
        self.record_phase(plan.collaboration_id, |collaboration, now| {
            collaboration.record_decomposition(subtasks.clone(), now);
            CollaborationPhase::Decomposed
        })
        .await;

        let results = self.execute_subtasks(&plan, &subtasks).await;
        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            collaboration_id = %plan.collaboration_id,
            subtasks = results.len(),
            failed,
            "subtasks executed"
        );
        self.record_phase(plan.collaboration_id, |collaboration, now| {
            collaboration.log(
                CollaborationPhase::SubtasksExecuted,
                json!({ "results": results }),
                now,
            );
            CollaborationPhase::SubtasksExecuted
        })
        .await;

        let integrated = self.integrate(&plan, &results).await?;
        self.record_phase(plan.collaboration_id, |collaboration, now| {
            collaboration.log(
                CollaborationPhase::Integrated,
                json!({ "output": integrated }),
                now,
            );
            CollaborationPhase::Integrated
        })
        .await;

        Ok(json!({
            "output": integrated,
            "collaboration_id": plan.collaboration_id,
            "participating_agents": plan.roles.iter().map(|r| &r.agent_id).collect::<Vec<_>>(),
            "execution_type": "hierarchical_collaboration",
            "subtask_results": results,
        }))
    }

    async fn decompose(&self, plan: &CollaborationPlan) -> CoordinatorResult<Vec<Subtask>> {
        let agents = std::iter::once(&plan.primary).chain(plan.helpers.iter());
        let roster: Vec<Value> = agents
            .zip(plan.roles.iter())
            .map(|(agent, role)| {
                json!({
                    "id": agent.id,
                    "type": agent.agent_type,
                    "capabilities": agent.capabilities,
                    "role": role.role,
                })
            })
            .collect();
        let roster_text = plan
            .roles
            .iter()
            .map(|r| format!("- {} ({})", r.agent_id, r.role))
            .collect::<Vec<_>>()
            .join("\n");

        let variables = HashMap::from([
            ("title", plan.task.title.clone()),
            ("description", plan.task.description.clone()),
            ("roster", roster_text),
        ]);
        let request = ExecutionRequest::new(
            library::task_decomposition().render_full(&variables),
            REASONING_HINT,
        )
        .insert("task", serde_json::to_value(&plan.task)?)
        .insert("available_agents", roster);

        let output = self
            .core
            .executor
            .execute(request)
            .await
            .map_err(|e| CoordinatorError::DecompositionFailed(e.to_string()))?;

        let parsed = self.core.parser.parse(&output_text(&output));
        Ok(fit_to_helpers(parsed, &plan.helpers))
    }

    async fn execute_subtasks(
        &self,
        plan: &CollaborationPlan,
        subtasks: &[Subtask],
    ) -> Vec<SubtaskResult> {
        let template = library::subtask_execution();
        let units = subtasks
            .iter()
            .zip(plan.helpers.iter().zip(plan.roles.iter().skip(1)))
            .map(|(subtask, (helper, role))| {
                let variables = HashMap::from([
                    ("role", role.role.clone()),
                    ("description", subtask.description.clone()),
                    ("details", subtask.details.clone()),
                ]);
                let request = ExecutionRequest::new(template.render(&variables), helper.execution_hint())
                    .with_context(enriched_context(&plan.task, helper))
                    .insert("subtask_description", subtask.description.clone())
                    .insert("subtask_details", subtask.details.clone())
                    .insert("agent_role", role.role.clone());
                let executor = self.core.executor.clone();

                async move {
                    let outcome = AssertUnwindSafe(executor.execute(request)).catch_unwind().await;
                    match outcome {
                        Ok(Ok(result)) => SubtaskResult::Succeeded {
                            agent_id: helper.id.clone(),
                            subtask: subtask.clone(),
                            result,
                        },
                        Ok(Err(e)) => SubtaskResult::Failed {
                            agent_id: helper.id.clone(),
                            subtask: subtask.clone(),
                            error: e.to_string(),
                        },
                        Err(panic) => SubtaskResult::Failed {
                            agent_id: helper.id.clone(),
                            subtask: subtask.clone(),
                            error: format!("subtask panicked: {}", panic_message(panic.as_ref())),
                        },
                    }
                }
            });

        join_all(units).await
    }

    async fn integrate(
        &self,
        plan: &CollaborationPlan,
        results: &[SubtaskResult],
    ) -> CoordinatorResult<Value> {
        let summary = results
            .iter()
            .map(SubtaskResult::summary)
            .collect::<Vec<_>>()
            .join("\n");
        let variables = HashMap::from([
            ("description", plan.task.description.clone()),
            ("results", summary),
        ]);
        let request = ExecutionRequest::new(
            library::result_integration().render_full(&variables),
            REASONING_HINT,
        )
        .insert("original_task", plan.task.description.clone())
        .insert("subtask_results", serde_json::to_value(results)?);

        self.core
            .executor
            .execute(request)
            .await
            .map_err(|e| CoordinatorError::ExecutionFailed(format!("integration failed: {}", e)))
    }

    /// Applies `update` to the stored collaboration, persists it and
    /// publishes the phase it reports
    async fn record_phase(
        &self,
        collaboration_id: Uuid,
        update: impl FnOnce(&mut Collaboration, DateTime<Utc>) -> CollaborationPhase,
    ) {
        let mut state = self.core.state.lock().await;
        let Some(collaboration) = state.store.collaboration_mut(collaboration_id) else {
            return;
        };
        if !collaboration.is_active() {
            return;
        }

        let phase = update(collaboration, Utc::now());
        self.core.save_collaboration(collaboration).await;
        self.core.publish_phase(collaboration, phase);
    }
}
