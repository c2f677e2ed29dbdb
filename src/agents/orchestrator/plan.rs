//! Planning stage: ask the model to split a request into agent subtasks.

use crate::llm::{GenerationOptions, LLMClient};
use crate::types::AgentDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One unit of work assigned to a named agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// May name an agent that is not registered; detected at execution
    #[serde(default)]
    pub assigned_agent: String,
}

/// Model-produced decomposition of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationPlan {
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub coordination_plan: String,
}

pub const FALLBACK_COORDINATION: &str = "Simple fallback execution";

impl OrchestrationPlan {
    /// Single subtask covering the whole request.
    pub fn fallback(request: &str, first_agent: Option<&str>) -> Self {
        Self {
            subtasks: vec![Subtask {
                id: "subtask_1".to_string(),
                description: request.to_string(),
                assigned_agent: first_agent.unwrap_or("unknown").to_string(),
            }],
            coordination_plan: FALLBACK_COORDINATION.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.coordination_plan == FALLBACK_COORDINATION
    }

    /// Give every subtask a unique id and a non-empty description.
    ///
    /// Missing or repeated ids become `subtask_<position>`; a blank
    /// description inherits the full request.
    pub fn normalize(&mut self, request: &str) {
        let mut seen: HashSet<String> = HashSet::with_capacity(self.subtasks.len());

        for (position, subtask) in self.subtasks.iter_mut().enumerate() {
            let id = subtask.id.trim();
            if id.is_empty() || seen.contains(id) {
                let base = format!("subtask_{}", position + 1);
                let mut candidate = base.clone();
                let mut suffix = 2;
                while seen.contains(&candidate) {
                    candidate = format!("{}_{}", base, suffix);
                    suffix += 1;
                }
                subtask.id = candidate;
            } else {
                subtask.id = id.to_string();
            }
            seen.insert(subtask.id.clone());

            if subtask.description.trim().is_empty() {
                subtask.description = request.to_string();
            }
            subtask.assigned_agent = subtask.assigned_agent.trim().to_string();
        }
    }
}

/// Instruction sent to the model.
pub fn build_prompt(agents: &[AgentDescriptor], request: &str) -> String {
    let agent_descriptions = if agents.is_empty() {
        "- (no agents registered)".to_string()
    } else {
        agents
            .iter()
            .map(|a| format!("- {} ({}): {}", a.name, a.description, a.supported_tasks.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You are an intelligent orchestrator that analyzes user requests and coordinates multiple agents to complete complex tasks.

Available Agents:
{agent_descriptions}

User Request: {request}

Your job is to:
1. Break down the request into subtasks
2. Assign each subtask to the most appropriate agent
3. Coordinate the execution
4. Synthesize the results

Return a JSON object with the following structure:
{{
    "subtasks": [
        {{
            "id": "subtask_1",
            "description": "What needs to be done",
            "assigned_agent": "agent_name"
        }}
    ],
    "coordination_plan": "Brief description of how to coordinate these subtasks"
}}"#
    )
}

/// First balanced JSON object in `text`, looking inside a Markdown fence
/// when there is one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let scope = fenced_block(text).unwrap_or(text);
    balanced_object(scope).or_else(|| balanced_object(text))
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string (`json`, `JSON`, ...)
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse model output into a plan. `None` when no usable plan is present.
pub fn parse_plan(text: &str) -> Option<OrchestrationPlan> {
    let json = extract_json_object(text)?;
    let plan: OrchestrationPlan = match serde_json::from_str(json) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!(error = %e, "Planner output is not a valid plan");
            return None;
        }
    };

    if plan.subtasks.is_empty() {
        tracing::warn!("Planner returned zero subtasks");
        return None;
    }

    Some(plan)
}

/// Run the planning stage. Never fails: any problem yields the fallback plan.
pub async fn plan(
    llm: &dyn LLMClient,
    agents: &[AgentDescriptor],
    request: &str,
) -> OrchestrationPlan {
    let first_agent = agents.first().map(|a| a.name.as_str());
    let prompt = build_prompt(agents, request);

    let mut plan = match llm
        .generate_with_options(&prompt, &GenerationOptions::new())
        .await
    {
        Ok(output) => parse_plan(&output).unwrap_or_else(|| {
            tracing::warn!("Falling back to single-subtask plan");
            OrchestrationPlan::fallback(request, first_agent)
        }),
        Err(e) => {
            tracing::error!(error = %e, "Error in orchestration planning");
            OrchestrationPlan::fallback(request, first_agent)
        }
    };

    plan.normalize(request);

    tracing::info!(
        subtasks = plan.subtasks.len(),
        fallback = plan.is_fallback(),
        coordination = %plan.coordination_plan,
        "Orchestration plan created"
    );

    plan
}
