//! Google Gemini client over the Generative Language REST API.

use crate::llm::client::{GenerationOptions, LLMClient, ModelParams};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public endpoint for the v1beta Generative Language API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    params: ModelParams,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(params.timeout_secs))
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            params,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    fn build_request(&self, prompt: &str, options: &GenerationOptions) -> GenerateContentRequest {
        let (temperature, max_output_tokens) = self.params.resolve(options);

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: options.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: system.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = self.build_request(prompt, options);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.to_string(),
            };
            return Err(AppError::LLM(format!(
                "Gemini API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Invalid Gemini response: {}", e)))?;

        body.text()
            .ok_or_else(|| AppError::LLM("No response from Gemini".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============= Wire Types =============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "key".to_string(),
            "https://example.test/v1beta/".to_string(),
            "gemini-2.5-flash".to_string(),
            ModelParams {
                temperature: 0.1,
                max_output_tokens: None,
                timeout_secs: 5,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = client().build_request(
            "Count users",
            &GenerationOptions::new()
                .with_system("You are a SQL expert")
                .with_temperature(0.3),
        );
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Count users");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a SQL expert"
        );
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(body.text().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn test_response_without_candidates() {
        let body: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(body.text().is_none());
    }
}
