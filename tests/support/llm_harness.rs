#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edubot::config::{Config, ModelConfig, ReliabilityConfig, SettingsStore, StaticSettings};
use edubot::llm::ResilientClient;

pub const API_KEY: &str = "sk-test-harness";

/// Marker present in every progress-evaluation prompt.
pub const EVALUATOR_MARKER: &str = "learning progress evaluator";
/// Marker present in every validator request.
pub const VALIDATOR_MARKER: &str = "Answer to evaluate";

pub fn model_config(server: &MockServer) -> ModelConfig {
    ModelConfig::new("openai", "gpt-test", API_KEY, format!("{}/v1", server.uri()))
}

pub fn settings(server: &MockServer) -> Arc<dyn SettingsStore> {
    Arc::new(StaticSettings::new(model_config(server)))
}

/// Client that retries quickly so failure paths stay fast.
pub fn fast_client(max_retries: u32) -> Arc<ResilientClient> {
    Arc::new(
        ResilientClient::new(&ReliabilityConfig::default())
            .with_backoff(1, 5)
            .with_max_retries(max_retries),
    )
}

/// Engine config pointing at the mock server, with ingestion pacing disabled.
pub fn engine_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.model.api_key = Some(API_KEY.into());
    config.model.base_url = format!("{}/v1", server.uri());
    config.ingestion.chunk_delay_ms = 0;
    config.ingestion.batch_delay_ms = 0;
    config
}

pub fn embedding_body(vector: &[f32]) -> Value {
    json!({
        "object": "list",
        "data": [{"object": "embedding", "index": 0, "embedding": vector}],
        "model": "text-embedding-3-small",
    })
}

pub fn chat_body(text: &str, total_tokens: u64) -> Value {
    json!({
        "id": "chatcmpl-test",
        "model": "gpt-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop",
        }],
        "usage": {"total_tokens": total_tokens},
    })
}

pub async fn mount_embeddings(server: &MockServer, vector: &[f32]) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(vector)))
        .mount(server)
        .await;
}

pub async fn mount_evaluator(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(EVALUATOR_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(reply, 5)))
        .with_priority(1)
        .mount(server)
        .await;
}

pub async fn mount_answer(server: &MockServer, text: &str, total_tokens: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(text, total_tokens)))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Body of every request the server received on `endpoint`.
pub async fn bodies_for(server: &MockServer, endpoint: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == endpoint)
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}
