use std::sync::Arc;

use async_trait::async_trait;

use super::reliable::ResilientClient;
use super::types::{ChatCompletion, ChatMessage, ChatRequest, ChatResponse, CompletionParams};
use crate::config::ModelConfig;
use crate::error::EduError;

/// A chat-completions backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
        config: &ModelConfig,
    ) -> Result<ChatCompletion, EduError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiChatModel {
    client: Arc<ResilientClient>,
}

impl OpenAiChatModel {
    pub fn new(client: Arc<ResilientClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
        config: &ModelConfig,
    ) -> Result<ChatCompletion, EduError> {
        config.ensure_usable()?;

        let request = ChatRequest {
            model: &config.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        let body = serde_json::to_value(&request)
            .map_err(|error| EduError::Other(anyhow::anyhow!("encode chat request: {error}")))?;

        let url = config.endpoint("chat/completions");
        let response = self.client.post_json(&url, &config.api_key, &body).await?;

        let parsed: ChatResponse = response.json().await.map_err(|error| {
            EduError::MalformedResponse(format!("chat response JSON decode failed: {error}"))
        })?;

        completion_from_response(parsed)
    }
}

fn completion_from_response(response: ChatResponse) -> Result<ChatCompletion, EduError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| EduError::MalformedResponse("no message content in choices".into()))?;

    Ok(ChatCompletion {
        text,
        total_tokens: response.usage.map_or(0, |usage| usage.total_tokens),
        model: response.model,
    })
}
