//! Synthesis stage: merge subtask results into one user-facing answer.

use super::execute::SubtaskResult;
use crate::llm::{GenerationOptions, LLMClient};

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are an expert at synthesizing information from multiple sources into a concise, direct response. \
Your job is to take the original question and the responses from different specialized agents, \
and create a single, focused answer that directly addresses the user's question.

Guidelines:
- Be concise and to the point
- Focus on the actual data and information, not on how to retrieve it
- Do not include SQL queries or technical instructions
- Do not mention agents or how the request was routed
- Present the information in a clear, readable format
- If multiple agents provide information about the same topic, combine them intelligently
- Use bullet points or numbered lists when appropriate for clarity
- Keep the response conversational but informative";

pub const NO_RESULTS_ANSWER: &str =
    "I was unable to process your request with the available agents.";

/// Per-agent lines shown to the model.
pub fn format_responses(results: &[SubtaskResult]) -> String {
    if results.is_empty() {
        return "No agent responses available.".to_string();
    }

    results
        .iter()
        .map(|r| match (&r.result, &r.error) {
            (Some(result), _) if r.is_completed() => format!("**{}**: {}", r.agent, result),
            (_, error) => format!(
                "**{}**: Failed to process - {}",
                r.agent,
                error.as_deref().unwrap_or("Unknown error")
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Deterministic answer used when the model cannot synthesize one.
pub fn fallback_answer(results: &[SubtaskResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_ANSWER.to_string();
    }

    results
        .iter()
        .map(|r| match &r.result {
            Some(result) if r.is_completed() => format!("{}: {}", r.agent, result),
            _ => format!("{}: Failed to process", r.agent),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(question: &str, results: &[SubtaskResult]) -> String {
    format!(
        "Original Question: {}\n\nAgent Responses:\n{}\n\n\
         Please provide a concise answer that directly addresses the original question using the information from the agents.",
        question,
        format_responses(results)
    )
}

/// Run the synthesis stage. The returned answer is never empty.
pub async fn synthesize(
    llm: &dyn LLMClient,
    question: &str,
    results: &[SubtaskResult],
    temperature: f32,
) -> String {
    let prompt = build_prompt(question, results);
    let options = GenerationOptions::new()
        .with_system(SYNTHESIS_SYSTEM_PROMPT)
        .with_temperature(temperature);

    match llm.generate_with_options(&prompt, &options).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!("Synthesis returned blank text, using fallback answer");
            fallback_answer(results)
        }
        Err(e) => {
            tracing::error!(error = %e, "Error in result synthesis");
            fallback_answer(results)
        }
    }
}
