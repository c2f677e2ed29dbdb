//! LLM provider tests. Gemini is exercised against a wiremock server.

use serde_json::json;
use text2sql::llm::{
    GenerationOptions, LLMClient, LLMClientFactory, ModelParams, Provider, gemini::GeminiClient,
};
use text2sql::utils::config::{LlmConfig, LlmProviderKind};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.5-flash";
const ENDPOINT: &str = "/models/gemini-2.5-flash:generateContent";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(
        "test-key".to_string(),
        server.uri(),
        MODEL.to_string(),
        ModelParams::default(),
    )
    .expect("client")
}

fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_gemini_generate_sends_key_and_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "How many users?" }] }],
            "systemInstruction": { "parts": [{ "text": "Reply with SQL only" }] },
            "generationConfig": { "temperature": 0.3 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("SELECT COUNT(*) FROM users")))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .generate_with_options(
            "How many users?",
            &GenerationOptions::new()
                .with_system("Reply with SQL only")
                .with_temperature(0.3),
        )
        .await
        .unwrap();

    assert_eq!(text, "SELECT COUNT(*) FROM users");
}

#[tokio::test]
async fn test_gemini_default_temperature_from_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({ "generationConfig": { "temperature": 0.1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("plan")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).generate("hi").await.unwrap(), "plan");
}

#[tokio::test]
async fn test_gemini_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).generate("hi").await.unwrap_err().to_string();
    assert!(err.contains("400"), "{}", err);
    assert!(err.contains("API key not valid"), "{}", err);
}

#[tokio::test]
async fn test_gemini_without_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client(&server).generate("hi").await.unwrap_err().to_string();
    assert!(err.contains("No response from Gemini"));
}

#[tokio::test]
async fn test_factory_builds_gemini_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("hello")))
        .mount(&server)
        .await;

    let config = LlmConfig {
        api_key: Some("test-key".to_string()),
        api_base: Some(server.uri()),
        ..LlmConfig::default()
    };
    let provider = Provider::from_config(&config).unwrap();
    assert_eq!(provider.name(), "Gemini");
    assert!(provider.is_available());

    let client = LLMClientFactory::new(provider).create_default().await.unwrap();
    assert_eq!(client.model_name(), MODEL);
    assert_eq!(client.generate("hi").await.unwrap(), "hello");
}

#[test]
fn test_provider_requires_api_key() {
    let config = LlmConfig {
        api_key: None,
        ..LlmConfig::default()
    };
    let err = Provider::from_config(&config).unwrap_err().to_string();
    assert!(err.contains("llm.api_key"));

    let ollama = LlmConfig {
        provider: LlmProviderKind::Ollama,
        model: "llama3.2".to_string(),
        ..LlmConfig::default()
    };
    match Provider::from_config(&ollama).unwrap() {
        Provider::Ollama { base_url, model, .. } => {
            assert_eq!(base_url, "http://localhost:11434");
            assert_eq!(model, "llama3.2");
        }
        other => panic!("expected Ollama provider, got {:?}", other),
    }
}
