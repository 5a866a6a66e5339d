use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ModelConfig;
use crate::error::EduError;
use crate::llm::ResilientClient;

/// Turns text into a vector for similarity search.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Embed a single text with the credentials and model in `config`
    async fn embed(&self, text: &str, config: &ModelConfig) -> Result<Vec<f32>, EduError>;
}

// ── OpenAI-compatible embedding provider ─────────────────────

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedding {
    client: Arc<ResilientClient>,
}

impl OpenAiEmbedding {
    pub fn new(client: Arc<ResilientClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    fn name(&self) -> &str {
        "openai"
    }

    async fn embed(&self, text: &str, config: &ModelConfig) -> Result<Vec<f32>, EduError> {
        config.ensure_usable()?;

        let body = serde_json::json!({
            "model": config.embedding_model,
            "input": text,
        });

        let response = self
            .client
            .post_json(&config.endpoint("embeddings"), &config.api_key, &body)
            .await?;

        let parsed: EmbeddingResponse = response.json().await.map_err(|error| {
            EduError::Embedding(format!("invalid embedding response: {error}"))
        })?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| EduError::Embedding("missing 'data[0]' in response".into()))?;

        if vector.is_empty() {
            return Err(EduError::Embedding("empty embedding vector".into()));
        }
        Ok(vector)
    }
}
