use crate::llm::client::{GenerationOptions, LLMClient, ModelParams};
use crate::types::{AppError, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: ModelParams,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, params: ModelParams) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model,
            params,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(system.clone()),
            ));
        }
        messages.push(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessage::from(prompt.to_string()),
        ));

        let (temperature, max_output_tokens) = self.params.resolve(options);

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(temperature);
        if let Some(limit) = max_output_tokens {
            builder.max_completion_tokens(limit);
        }
        let request = builder
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build request: {}", e)))?;

        let response = tokio::time::timeout(
            Duration::from_secs(self.params.timeout_secs),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| {
            AppError::LLM(format!(
                "OpenAI request timed out after {}s",
                self.params.timeout_secs
            ))
        })?
        .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
