use crate::{
    agents::Agent,
    db::{DatabaseService, SchemaFormat},
    llm::{GenerationOptions, LLMClient},
    types::{AgentDescriptor, AgentOutput, AgentRequest, AgentResponse, Result},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

const SQL_SYSTEM_PROMPT: &str = "You are a SQL expert that converts natural language questions into SQL queries.
Your response should be a valid SQL query only, with no additional text or explanation.
The query should be complete and ready to execute.";

const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant that explains database query results in natural language.
Your response should be clear, concise, and directly answer the user's question.
Do not mention SQL queries or technical details.
Focus on providing the information the user asked for in a natural way.";

const SQL_TEMPERATURE: f32 = 0.3;
const ANSWER_TEMPERATURE: f32 = 0.7;

/// Answers questions by generating SQL, running it and phrasing the rows.
pub struct Text2SqlAgent {
    llm: Arc<dyn LLMClient>,
    db: Arc<DatabaseService>,
}

impl Text2SqlAgent {
    /// Registry name of this agent
    pub const NAME: &'static str = "text2sql";

    pub fn new(llm: Arc<dyn LLMClient>, db: Arc<DatabaseService>) -> Self {
        Self { llm, db }
    }

    async fn generate_sql(&self, schema: &str, question: &str) -> Result<String> {
        let prompt = format!(
            "Given the following database schema:\n{schema}\n\n\
             Convert the following natural language question into a SQL query.\n\n\
             Question: {question}\n\n\
             Please provide a SQL query that would answer this question.\n\
             The query should be valid SQL and should be the complete query needed to get the answer."
        );

        let raw = self
            .llm
            .generate_with_options(
                &prompt,
                &GenerationOptions::new()
                    .with_system(SQL_SYSTEM_PROMPT)
                    .with_temperature(SQL_TEMPERATURE),
            )
            .await?;

        Ok(strip_sql_fence(&raw))
    }

    async fn phrase_answer(
        &self,
        schema: &str,
        question: &str,
        sql: &str,
        results: &str,
    ) -> Result<String> {
        let prompt = format!(
            "Given the following database schema:\n{schema}\n\n\
             Original question: {question}\n\
             SQL query: {sql}\n\
             Query results: {results}\n\n\
             Please provide a natural language answer that directly addresses the original question.\n\
             The answer should be clear, concise, and easy to understand.\n\
             Do not mention SQL or technical details in the response."
        );

        let answer = self
            .llm
            .generate_with_options(
                &prompt,
                &GenerationOptions::new()
                    .with_system(ANSWER_SYSTEM_PROMPT)
                    .with_temperature(ANSWER_TEMPERATURE),
            )
            .await?;

        Ok(answer.trim().to_string())
    }

    /// Schema, SQL, execution and phrasing. Database failures become the
    /// answer text; LLM failures propagate.
    async fn run(&self, question: &str) -> Result<AgentOutput> {
        let schema = match self.db.get_schema(SchemaFormat::Text).await {
            Ok(schema) => schema,
            Err(e) => {
                tracing::error!(error = %e, "Failed to get schema");
                return Ok(AgentOutput::new(format!("Error getting schema: {}", e))
                    .with_metadata("sql_query", serde_json::Value::Null));
            }
        };

        let sql = self.generate_sql(&schema, question).await?;
        tracing::info!(sql = %sql, "Generated SQL query");

        let results = match self.db.execute_query(&sql).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(error = %e, sql = %sql, "Query execution failed");
                return Ok(AgentOutput::new(format!("Error executing query: {}", e))
                    .with_metadata("sql_query", sql));
            }
        };

        let answer = self
            .phrase_answer(&schema, question, &sql, &results.render())
            .await?;

        Ok(AgentOutput::new(answer).with_metadata("sql_query", sql))
    }
}

/// Trim the model reply and drop a surrounding Markdown code fence.
pub fn strip_sql_fence(raw: &str) -> String {
    let mut sql = raw.trim();
    if let Some(rest) = sql.strip_prefix("```") {
        sql = match rest.split_once('\n') {
            // Info string (`sql`, `SQL`, `postgresql`, ...)
            Some((info, body))
                if info
                    .trim()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
            {
                body
            }
            _ => rest,
        };
    }
    if let Some(rest) = sql.strip_suffix("```") {
        sql = rest;
    }
    sql.trim().to_string()
}

#[async_trait]
impl Agent for Text2SqlAgent {
    async fn process(&self, request: &AgentRequest) -> Result<AgentResponse> {
        tracing::info!(question = %request.question, "text2sql processing request");

        match self.run(&request.question).await {
            Ok(output) => Ok(AgentResponse::success(output)),
            Err(e) => {
                tracing::error!(error = %e, "Error in text2sql agent");
                Ok(AgentResponse::failure(e.to_string()))
            }
        }
    }

    fn capabilities(&self) -> AgentDescriptor {
        AgentDescriptor {
            name: Self::NAME.to_string(),
            description: "Converts natural language questions to SQL queries and executes them"
                .to_string(),
            supported_tasks: vec!["sql".into(), "query".into(), "database".into()],
            input_format: BTreeMap::from([(
                "question".to_string(),
                "Natural language question".to_string(),
            )]),
            output_format: BTreeMap::from([
                ("summary".to_string(), "Natural language answer".to_string()),
                (
                    "sql_query".to_string(),
                    "SQL query used to generate the answer".to_string(),
                ),
            ]),
            available_agents: vec![],
        }
    }

    fn name(&self) -> String {
        Self::NAME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SELECT 1", "SELECT 1")]
    #[case("```sql\nSELECT * FROM users;\n```", "SELECT * FROM users;")]
    #[case("```\nSELECT 2\n```\n", "SELECT 2")]
    #[case("```SQL\nSELECT 3\n```", "SELECT 3")]
    #[case("``` sqlite \nSELECT 4\n```", "SELECT 4")]
    #[case("```SELECT 5```", "SELECT 5")]
    #[case("  select name from users  ", "select name from users")]
    fn test_strip_sql_fence(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_sql_fence(raw), expected);
    }
}
