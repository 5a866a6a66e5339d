use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edubot::config::ReliabilityConfig;
use edubot::error::{EduError, RequestError};
use edubot::llm::{ChatMessage, ChatModel, CompletionParams, OpenAiChatModel, ResilientClient};

use crate::llm_harness::{API_KEY, chat_body, fast_client, model_config};

#[tokio::test]
async fn rate_limit_waits_for_retry_after_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = ResilientClient::new(&ReliabilityConfig::default());
    let started = Instant::now();
    let response = client
        .post_json(
            &format!("{}/v1/embeddings", server.uri()),
            API_KEY,
            &json!({"input": "x"}),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn transient_upstream_error_is_retried_by_chat_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Recovered.", 9)))
        .with_priority(2)
        .mount(&server)
        .await;

    let model = OpenAiChatModel::new(fast_client(3));
    let completion = model
        .complete(
            &[ChatMessage::user("Hi")],
            &CompletionParams::new(0.7, 64),
            &model_config(&server),
        )
        .await
        .unwrap();

    assert_eq!(completion.text, "Recovered.");
    assert_eq!(completion.total_tokens, 9);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn exhausted_retries_surface_sanitized_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("internal failure for key sk-live-abcdef123456"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(fast_client(2)));
    let err = model
        .complete(
            &[ChatMessage::user("Hi")],
            &CompletionParams::new(0.7, 64),
            &model_config(&server),
        )
        .await
        .unwrap_err();

    match err {
        EduError::Request(RequestError::Upstream { status, body }) => {
            assert_eq!(status, 500);
            assert!(!body.contains("abcdef123456"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
