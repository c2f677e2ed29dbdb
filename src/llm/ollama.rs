use crate::llm::client::{GenerationOptions, LLMClient, ModelParams};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
    models::ModelOptions,
};
use std::time::Duration;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    params: ModelParams,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, params: ModelParams) -> Self {
        let (host, port) = split_base_url(&base_url);
        let client = Ollama::new(host, port);

        Self {
            client,
            model,
            params,
        }
    }
}

/// Split `scheme://host:port` into the pieces `Ollama::new` expects.
fn split_base_url(base_url: &str) -> (String, u16) {
    let (scheme, rest) = base_url
        .split_once("://")
        .unwrap_or(("http", base_url));
    let rest = rest.trim_end_matches('/');

    match rest.rsplit_once(':') {
        Some((host, port)) => (
            format!("{}://{}", scheme, host),
            port.parse().unwrap_or(11434),
        ),
        None => (format!("{}://{}", scheme, rest), 11434),
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt.to_string()));

        let (temperature, max_output_tokens) = self.params.resolve(options);
        let mut model_options = ModelOptions::default().temperature(temperature);
        if let Some(limit) = max_output_tokens {
            model_options = model_options.num_predict(limit as i32);
        }

        let request =
            ChatMessageRequest::new(self.model.clone(), messages).options(model_options);

        let response = tokio::time::timeout(
            Duration::from_secs(self.params.timeout_secs),
            self.client.send_chat_messages(request),
        )
        .await
        .map_err(|_| {
            AppError::LLM(format!(
                "Ollama request timed out after {}s",
                self.params.timeout_secs
            ))
        })?
        .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_base_url() {
        assert_eq!(
            split_base_url("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
        assert_eq!(
            split_base_url("https://ollama.internal"),
            ("https://ollama.internal".to_string(), 11434)
        );
        assert_eq!(
            split_base_url("gpu-box:8080/"),
            ("http://gpu-box".to_string(), 8080)
        );
    }
}
