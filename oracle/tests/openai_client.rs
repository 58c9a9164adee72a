//! OpenAI-compatible client against a mock HTTP server.

use logos_oracle::{ClientError, CompletionOptions, ModelClient, OpenAiClient};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_chat_completion_roundtrip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  summary please \n"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(
        format!("{}/v1", server.uri()),
        Some("sk-test".to_string()),
        None,
    )
    .unwrap();

    let completion = client
        .complete("gpt-4o-mini", "Summarize the minutes", &CompletionOptions::default())
        .await
        .unwrap();

    assert_eq!(completion.text, "summary please");
    assert_eq!(completion.metadata.id.as_deref(), Some("chatcmpl-1"));
    assert_eq!(completion.metadata.model, "gpt-4o-mini");
    assert_eq!(completion.metadata.usage.unwrap().total_tokens, 8);
}

#[tokio::test]
async fn test_rate_limit_maps_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(format!("{}/v1", server.uri()), None, None).unwrap();
    let err = client
        .complete("gpt-4o-mini", "hi", &CompletionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::RateLimited { retry_after_ms: Some(2000) }));
}

#[tokio::test]
async fn test_server_error_is_request_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(format!("{}/v1", server.uri()), None, None).unwrap();
    let err = client
        .complete("gpt-4o-mini", "hi", &CompletionOptions::default())
        .await
        .unwrap_err();

    match err {
        ClientError::RequestFailed(msg) => assert!(msg.contains("upstream down")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_choices_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(format!("{}/v1", server.uri()), None, None).unwrap();
    let err = client
        .complete("gpt-4o-mini", "hi", &CompletionOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::ParseError(_)));
}
