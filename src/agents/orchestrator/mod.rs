//! Orchestrator agent
//!
//! Answers a question in three sequential stages:
//!
//! 1. [`plan`] asks the model to split the request into subtasks, each
//!    assigned to a registered agent;
//! 2. [`execute`] runs the subtasks against their agents with bounded
//!    concurrency and joins the results in plan order;
//! 3. [`synthesize`] asks the model to merge the results into one answer.
//!
//! Planning and synthesis fall back to deterministic output when the model
//! fails, so a request only fails outright when no answer text is produced.

pub mod execute;
pub mod plan;
pub mod synthesize;

pub use execute::{SubtaskResult, SubtaskStatus};
pub use plan::{OrchestrationPlan, Subtask};

use crate::{
    agents::{Agent, AgentRegistry},
    llm::LLMClient,
    types::{
        AgentDescriptor, AgentOutput, AgentRequest, AgentResponse, AgentStatus, Result,
        StatsResponse,
    },
    utils::config::OrchestratorConfig,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Instrument;

/// Full record of one orchestrated request.
#[derive(Debug, Clone)]
pub struct Orchestration {
    pub request_id: uuid::Uuid,
    pub plan: OrchestrationPlan,
    pub results: Vec<SubtaskResult>,
    pub answer: String,
    pub status: AgentStatus,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Coordinates the registered agents.
///
/// The orchestrator is not part of the registry it plans over, so it is never
/// offered to itself as a target.
pub struct Orchestrator {
    llm: Arc<dyn LLMClient>,
    registry: Arc<AgentRegistry>,
    settings: OrchestratorConfig,
    counters: Counters,
    started_at: DateTime<Utc>,
}

impl Orchestrator {
    pub const NAME: &'static str = "orchestrator";
    pub const METHOD: &'static str = "plan_execute_synthesize";

    pub fn new(
        llm: Arc<dyn LLMClient>,
        registry: Arc<AgentRegistry>,
        settings: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            settings,
            counters: Counters::default(),
            started_at: Utc::now(),
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    fn planning_targets(&self) -> Vec<AgentDescriptor> {
        self.registry
            .descriptors()
            .into_iter()
            .filter(|d| d.name != Self::NAME)
            .collect()
    }

    /// Run plan, execute and synthesize for one question.
    pub async fn orchestrate(&self, question: &str) -> Orchestration {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("orchestrate", %request_id);

        async move {
            tracing::info!(status = %AgentStatus::Processing, question, "Processing request");

            let targets = self.planning_targets();
            let plan = plan::plan(self.llm.as_ref(), &targets, question).await;

            let results = execute::execute_plan(
                &self.registry,
                &plan,
                self.settings.failure_policy,
                self.settings.max_concurrent_subtasks,
            )
            .await;

            let answer = synthesize::synthesize(
                self.llm.as_ref(),
                question,
                &results,
                self.settings.synthesis_temperature,
            )
            .await;

            let status = if answer.trim().is_empty() {
                AgentStatus::Error
            } else {
                AgentStatus::Completed
            };
            tracing::info!(%status, "Request finished");

            Orchestration {
                request_id,
                plan,
                results,
                answer,
                status,
            }
        }
        .instrument(span)
        .await
    }

    /// Orchestration statistics
    pub fn stats(&self) -> StatsResponse {
        let available_agents = self.registry.names();
        StatsResponse {
            total_agents: available_agents.len(),
            available_agents,
            orchestration_method: Self::METHOD.to_string(),
            requests_total: self.counters.total.load(Ordering::Relaxed),
            requests_completed: self.counters.completed.load(Ordering::Relaxed),
            requests_failed: self.counters.failed.load(Ordering::Relaxed),
            started_at: self.started_at,
        }
    }
}

#[async_trait]
impl Agent for Orchestrator {
    async fn process(&self, request: &AgentRequest) -> Result<AgentResponse> {
        self.counters.total.fetch_add(1, Ordering::Relaxed);

        let outcome = self.orchestrate(&request.question).await;

        if outcome.status == AgentStatus::Completed {
            self.counters.completed.fetch_add(1, Ordering::Relaxed);
            let failed = outcome.results.iter().filter(|r| !r.is_completed()).count();
            Ok(AgentResponse::success(
                AgentOutput::new(outcome.answer)
                    .with_metadata("request_id", outcome.request_id.to_string())
                    .with_metadata("subtasks", outcome.plan.subtasks.len())
                    .with_metadata("failed_subtasks", failed),
            ))
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            Ok(AgentResponse::failure(
                "Orchestration failed to produce a valid response",
            ))
        }
    }

    fn capabilities(&self) -> AgentDescriptor {
        AgentDescriptor {
            name: Self::NAME.to_string(),
            description:
                "Intelligent orchestrator that coordinates multiple agents to complete complex tasks"
                    .to_string(),
            supported_tasks: vec![
                "task_decomposition".into(),
                "agent_coordination".into(),
                "result_synthesis".into(),
            ],
            input_format: BTreeMap::from([(
                "question".to_string(),
                "Natural language question or complex task request".to_string(),
            )]),
            output_format: BTreeMap::from([(
                "summary".to_string(),
                "Comprehensive natural language answer that synthesizes responses from multiple agents"
                    .to_string(),
            )]),
            available_agents: self.registry.names(),
        }
    }

    fn name(&self) -> String {
        Self::NAME.to_string()
    }
}
