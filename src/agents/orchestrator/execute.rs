//! Execution stage: run each planned subtask against its agent.

use super::plan::{OrchestrationPlan, Subtask};
use crate::agents::{Agent, AgentRegistry};
use crate::types::{AgentRequest, AgentResponse};
use crate::utils::config::FailurePolicy;
use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskStatus {
    Completed,
    Failed,
}

/// Outcome of one subtask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub subtask_id: String,
    pub description: String,
    pub agent: String,
    pub status: SubtaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubtaskResult {
    fn completed(subtask: &Subtask, result: String) -> Self {
        Self {
            subtask_id: subtask.id.clone(),
            description: subtask.description.clone(),
            agent: subtask.assigned_agent.clone(),
            status: SubtaskStatus::Completed,
            result: Some(result),
            error: None,
        }
    }

    fn failed(subtask: &Subtask, error: String) -> Self {
        Self {
            subtask_id: subtask.id.clone(),
            description: subtask.description.clone(),
            agent: subtask.assigned_agent.clone(),
            status: SubtaskStatus::Failed,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SubtaskStatus::Completed
    }
}

/// How a single subtask ended.
enum Outcome {
    /// Completed, or failed for a reason that never aborts (unknown agent)
    Settled(SubtaskResult),
    /// The agent itself failed
    AgentFailed(SubtaskResult),
}

impl Outcome {
    fn into_result(self) -> SubtaskResult {
        match self {
            Outcome::Settled(r) | Outcome::AgentFailed(r) => r,
        }
    }
}

async fn run_subtask(agent: Option<Arc<dyn Agent>>, subtask: Subtask) -> Outcome {
    let Some(agent) = agent else {
        tracing::warn!(agent = %subtask.assigned_agent, "Agent not found");
        let error = format!("Agent {} not found", subtask.assigned_agent);
        return Outcome::Settled(SubtaskResult::failed(&subtask, error));
    };

    let request = AgentRequest::new(subtask.description.clone());
    let span = tracing::Span::current();

    // A panicking agent only takes its own subtask down, and dropping the
    // set aborts the agent when an aborted plan drops this future.
    let mut task = JoinSet::new();
    task.spawn(async move { agent.process(&request).await }.instrument(span));

    match task.join_next().await {
        Some(Ok(Ok(AgentResponse {
            success: true,
            data: Some(output),
            ..
        }))) => Outcome::Settled(SubtaskResult::completed(&subtask, output.summary)),
        Some(Ok(Ok(response))) => {
            let error = response
                .error
                .unwrap_or_else(|| "Agent returned no data".to_string());
            tracing::warn!(agent = %subtask.assigned_agent, error = %error, "Subtask failed");
            Outcome::AgentFailed(SubtaskResult::failed(&subtask, error))
        }
        Some(Ok(Err(e))) => {
            tracing::error!(agent = %subtask.assigned_agent, error = %e, "Agent error");
            Outcome::AgentFailed(SubtaskResult::failed(&subtask, e.to_string()))
        }
        Some(Err(join_error)) => {
            tracing::error!(agent = %subtask.assigned_agent, error = %join_error, "Agent task aborted");
            Outcome::AgentFailed(crashed(&subtask))
        }
        None => Outcome::AgentFailed(crashed(&subtask)),
    }
}

fn crashed(subtask: &Subtask) -> SubtaskResult {
    SubtaskResult::failed(subtask, format!("Agent {} crashed", subtask.assigned_agent))
}

/// Run every subtask of `plan`, at most `max_concurrent` at a time.
///
/// Results come back in plan order. Under [`FailurePolicy::Isolate`] there is
/// exactly one result per subtask; under [`FailurePolicy::Abort`] the first
/// agent failure discards everything, cancels subtasks still in flight and
/// starts no further ones.
pub async fn execute_plan(
    registry: &AgentRegistry,
    plan: &OrchestrationPlan,
    policy: FailurePolicy,
    max_concurrent: usize,
) -> Vec<SubtaskResult> {
    tracing::info!(subtasks = plan.subtasks.len(), ?policy, "Executing subtasks");

    let outcomes = stream::iter(plan.subtasks.iter().cloned())
        .map(|subtask| {
            let agent = registry.get(&subtask.assigned_agent);
            run_subtask(agent, subtask)
        })
        .buffered(max_concurrent.max(1));

    let results = match policy {
        FailurePolicy::Isolate => {
            outcomes
                .map(Outcome::into_result)
                .collect::<Vec<_>>()
                .await
        }
        FailurePolicy::Abort => {
            let collected = outcomes
                .map(|outcome| match outcome {
                    Outcome::Settled(r) => Ok(r),
                    Outcome::AgentFailed(r) => Err(r),
                })
                .try_collect::<Vec<_>>()
                .await;

            match collected {
                Ok(results) => results,
                Err(failed) => {
                    tracing::error!(
                        subtask = %failed.subtask_id,
                        error = ?failed.error,
                        "Error in subtask execution, discarding all results"
                    );
                    Vec::new()
                }
            }
        }
    };

    tracing::info!(
        completed = results.iter().filter(|r| r.is_completed()).count(),
        total = results.len(),
        "Completed subtasks"
    );

    results
}
