//! HTTP provider tests against a local mock server

use polex_domain::{CompletionRequest, LlmProvider};
use polex_llm::{LlmError, LlmGateway, OllamaProvider, OpenAiProvider, RetryPolicy};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn openai(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new("sk-test", "gpt-4.1-mini")
        .unwrap()
        .with_base_url(format!("{}/v1", server.uri()))
}

#[tokio::test]
async fn test_openai_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4.1-mini",
            "temperature": 0.0,
            "max_tokens": 500,
            "messages": [{"role": "user", "content": "extract"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply(r#"{"instrument_type":"grant"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let text = openai(&server)
        .complete(&CompletionRequest::new("extract", 500))
        .await
        .unwrap();
    assert_eq!(text, r#"{"instrument_type":"grant"}"#);
}

#[tokio::test]
async fn test_openai_server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = openai(&server)
        .complete(&CompletionRequest::new("p", 10))
        .await
        .unwrap_err();
    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = openai(&server)
        .complete(&CompletionRequest::new("p", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::RateLimitExceeded));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_openai_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = openai(&server)
        .complete(&CompletionRequest::new("p", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_openai_no_choices_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = openai(&server)
        .complete(&CompletionRequest::new("p", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_gateway_retries_transient_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("{\"ok\": true}")))
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(openai(&server))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(10)));
    let text = gateway.complete("p", 10).await.unwrap();

    assert_eq!(text, "{\"ok\": true}");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_gateway_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(openai(&server))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(5)));
    let err = gateway.complete("p", 10).await.unwrap_err();

    match err {
        LlmError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, LlmError::Api { status: 502, .. }));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ollama_generate_sends_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.1",
            "prompt": "extract",
            "stream": false,
            "options": {"temperature": 0.0, "num_predict": 256}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1",
            "response": "{\"category\": \"loan\"}",
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1").unwrap();
    let text = provider
        .complete(&CompletionRequest::new("extract", 256))
        .await
        .unwrap();
    assert_eq!(text, "{\"category\": \"loan\"}");
}

#[tokio::test]
async fn test_ollama_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "nope").unwrap();
    let err = provider
        .complete(&CompletionRequest::new("p", 8))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::ModelNotAvailable(ref m) if m == "nope"));
}
