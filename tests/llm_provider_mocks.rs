//! Integration tests for the HTTP-backed providers against a local
//! `wiremock` server: OpenAI, Anthropic multi-block concatenation, Gemini,
//! and 429 retry-then-success.

use shotgun_context::cancel::CancellationToken;
use shotgun_context::llm::anthropic::AnthropicProvider;
use shotgun_context::llm::gemini::GeminiProvider;
use shotgun_context::llm::openai::OpenAIProvider;
use shotgun_context::llm::{LLMConfig, Provider};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(provider: &str, base_url: &str) -> LLMConfig {
    LLMConfig {
        provider: provider.to_string(),
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
        timeout_seconds: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn openai_send_parses_response_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello from OpenAI"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })))
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(config("openai", &server.uri())).unwrap();
    let result = provider.send("hi", &CancellationToken::new()).await.unwrap();

    assert_eq!(result.response, "Hello from OpenAI");
    let usage = result.usage.unwrap();
    assert_eq!(usage.prompt_tokens, Some(10));
    assert_eq!(usage.completion_tokens, Some(5));
    assert_eq!(usage.total_tokens, Some(15));
}

#[tokio::test]
async fn anthropic_send_concatenates_text_blocks_and_sums_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [
                {"type": "text", "text": "Part one. "},
                {"type": "text", "text": "Part two."}
            ],
            "usage": {"input_tokens": 20, "output_tokens": 8}
        })))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(config("anthropic", &server.uri())).unwrap();
    let result = provider.send("hi", &CancellationToken::new()).await.unwrap();

    assert_eq!(result.response, "Part one. Part two.");
    let usage = result.usage.unwrap();
    assert_eq!(usage.prompt_tokens, Some(20));
    assert_eq!(usage.completion_tokens, Some(8));
    assert_eq!(usage.total_tokens, Some(28));
}

#[tokio::test]
async fn gemini_send_parses_candidate_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Hello from Gemini"}]}}],
            "usageMetadata": {
                "promptTokenCount": 12,
                "candidatesTokenCount": 4,
                "totalTokenCount": 16
            }
        })))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(config("gemini", &server.uri())).unwrap();
    let result = provider.send("hi", &CancellationToken::new()).await.unwrap();

    assert_eq!(result.response, "Hello from Gemini");
    let usage = result.usage.unwrap();
    assert_eq!(usage.total_tokens, Some(16));
}

#[tokio::test]
async fn retries_on_429_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Recovered"}}]
        })))
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(config("openai", &server.uri())).unwrap();
    let result = provider.send("hi", &CancellationToken::new()).await.unwrap();
    assert_eq!(result.response, "Recovered");
}

#[tokio::test]
async fn non_retryable_4xx_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIProvider::new(config("openai", &server.uri())).unwrap();
    let err = provider.send("hi", &CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("401") || err.to_string().to_lowercase().contains("unauthorized"));
}
