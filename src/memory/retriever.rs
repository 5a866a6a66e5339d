use std::sync::Arc;

use super::embeddings::EmbeddingProvider;
use super::traits::{DocumentStore, RetrievedChunk};
use super::vector::top_k_above;
use crate::config::ModelConfig;
use crate::error::EduError;

/// Top-K similarity lookup over one collection's chunks.
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// Best-effort retrieval: any failure is logged and yields no context.
    pub async fn retrieve(
        &self,
        collection_id: &str,
        query: &str,
        config: &ModelConfig,
        top_k: usize,
        min_similarity: f32,
    ) -> Vec<RetrievedChunk> {
        match self
            .try_retrieve(collection_id, query, config, top_k, min_similarity)
            .await
        {
            Ok(chunks) => chunks,
            Err(error) => {
                tracing::warn!(
                    collection_id,
                    error = %error,
                    "retrieval failed, answering without context"
                );
                Vec::new()
            }
        }
    }

    pub async fn try_retrieve(
        &self,
        collection_id: &str,
        query: &str,
        config: &ModelConfig,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<RetrievedChunk>, EduError> {
        if top_k == 0 || !self.store.has_embedded_chunks(collection_id).await? {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query, config).await?;
        let hits = self
            .store
            .similarity_search(collection_id, &query_vector, min_similarity, top_k)
            .await?;

        // Re-apply floor and order; the store contract is not trusted blindly.
        let ranked = top_k_above(
            hits.into_iter()
                .map(|hit| {
                    let score = hit.similarity;
                    (hit, score)
                })
                .collect(),
            min_similarity,
            top_k,
        );

        tracing::debug!(collection_id, hits = ranked.len(), "retrieved context");
        Ok(ranked.into_iter().map(|(hit, _)| hit).collect())
    }
}
