//! Mock implementations for testing.
//!
//! [`MockLLMClient`] answers by matching substrings of the system message or
//! prompt, so concurrent callers get deterministic replies regardless of
//! scheduling. [`MockAgent`] is a hand-configurable [`Agent`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use text2sql::{
    agents::Agent,
    llm::{GenerationOptions, LLMClient},
    types::{AgentDescriptor, AgentOutput, AgentRequest, AgentResponse, AppError, Result},
};

/// Appears in the planning prompt.
pub const PLAN_MARKER: &str = "intelligent orchestrator";
/// Appears in the SQL generation system message.
pub const SQL_MARKER: &str = "SQL expert";
/// Appears in the result phrasing system message.
pub const ANSWER_MARKER: &str = "explains database query results";
/// Appears in the synthesis system message.
pub const SYNTHESIS_MARKER: &str = "synthesizing information";

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// One recorded call to the mock.
#[derive(Debug, Clone)]
pub struct LlmCall {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
}

/// Rule-based mock LLM client.
pub struct MockLLMClient {
    rules: Vec<(String, Reply)>,
    default: Reply,
    calls: Mutex<Vec<LlmCall>>,
}

impl MockLLMClient {
    /// Reply with `response` when no rule matches.
    pub fn new(response: &str) -> Self {
        Self {
            rules: Vec::new(),
            default: Reply::Text(response.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call that no rule matches.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default: Reply::Fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `response` when `needle` occurs in the system message or prompt.
    pub fn when(mut self, needle: &str, response: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Text(response.to_string())));
        self
    }

    /// Fail when `needle` occurs in the system message or prompt.
    pub fn fail_when(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail));
        self
    }

    pub fn into_arc(self) -> Arc<dyn LLMClient> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<LlmCall> {
        self.calls.lock().clone()
    }

    /// Calls whose system message or prompt contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> Vec<LlmCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches(c, needle))
            .collect()
    }
}

fn matches(call: &LlmCall, needle: &str) -> bool {
    call.prompt.contains(needle)
        || call
            .system
            .as_deref()
            .is_some_and(|system| system.contains(needle))
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let call = LlmCall {
            system: options.system.clone(),
            prompt: prompt.to_string(),
            temperature: options.temperature,
        };

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| matches(&call, needle))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone());

        self.calls.lock().push(call);

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(AppError::LLM("Mock LLM failure".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Echo,
    Unsuccessful(String),
    Error(String),
    Panic,
}

/// Hand-configurable agent.
pub struct MockAgent {
    name: String,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
    finished: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: Arc<AtomicUsize>,
    requests: Mutex<Vec<String>>,
}

impl MockAgent {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            delay: None,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds with a fixed summary.
    pub fn replying(name: &str, summary: &str) -> Self {
        Self::with_behavior(name, Behavior::Reply(summary.to_string()))
    }

    /// Succeeds with `"<name>: <question>"`.
    pub fn echo(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Echo)
    }

    /// Returns `success: false` with this error.
    pub fn unsuccessful(name: &str, error: &str) -> Self {
        Self::with_behavior(name, Behavior::Unsuccessful(error.to_string()))
    }

    /// Returns `Err`.
    pub fn erroring(name: &str, error: &str) -> Self {
        Self::with_behavior(name, Behavior::Error(error.to_string()))
    }

    pub fn panicking(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Panic)
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Share a peak-concurrency counter with other agents.
    pub fn with_peak_counter(mut self, peak: Arc<AtomicUsize>) -> Self {
        self.peak_in_flight = peak;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran past the delay.
    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    async fn process(&self, request: &AgentRequest) -> Result<AgentResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.question.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Reply(summary) => Ok(AgentResponse::success(AgentOutput::new(summary.clone()))),
            Behavior::Echo => Ok(AgentResponse::success(AgentOutput::new(format!(
                "{}: {}",
                self.name, request.question
            )))),
            Behavior::Unsuccessful(error) => Ok(AgentResponse::failure(error.clone())),
            Behavior::Error(error) => Err(AppError::Internal(error.clone())),
            Behavior::Panic => panic!("{} exploded", self.name),
        }
    }

    fn capabilities(&self) -> AgentDescriptor {
        AgentDescriptor {
            name: self.name.clone(),
            description: format!("Mock agent {}", self.name),
            supported_tasks: vec!["testing".to_string()],
            input_format: BTreeMap::new(),
            output_format: BTreeMap::new(),
            available_agents: Vec::new(),
        }
    }
}

/// Planner reply assigning one subtask per `(agent, description)` pair.
pub fn plan_json(subtasks: &[(&str, &str)]) -> String {
    let subtasks: Vec<_> = subtasks
        .iter()
        .enumerate()
        .map(|(i, (agent, description))| {
            serde_json::json!({
                "id": format!("subtask_{}", i + 1),
                "description": description,
                "assigned_agent": agent,
            })
        })
        .collect();
    serde_json::json!({
        "subtasks": subtasks,
        "coordination_plan": "Run the subtasks and combine the results",
    })
    .to_string()
}
