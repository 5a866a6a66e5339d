use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A bounded slice of a source document, with its embedding once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub collection_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl DocumentChunk {
    pub fn new(
        document_id: impl Into<String>,
        collection_id: impl Into<String>,
        content: impl Into<String>,
        embedding: Option<Vec<f32>>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: document_id.into(),
            collection_id: collection_id.into(),
            content: content.into(),
            embedding,
        }
    }
}

/// A chunk returned by similarity search. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    /// Cosine similarity in [0, 1]
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub document_id: String,
    pub collection_id: String,
    pub chunk_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Persistence for document chunks and their vectors.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    async fn collection_exists(&self, collection_id: &str) -> Result<bool, StoreError>;

    /// Cheap check used to skip the embedding call for empty collections.
    async fn has_embedded_chunks(&self, collection_id: &str) -> Result<bool, StoreError>;

    /// Returns the number of rows removed.
    async fn delete_document_chunks(&self, document_id: &str) -> Result<usize, StoreError>;

    async fn insert_chunk(&self, chunk: DocumentChunk) -> Result<(), StoreError>;

    /// Chunks in `collection_id` scoring at least `threshold`, best first, at most `limit`.
    async fn similarity_search(
        &self,
        collection_id: &str,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError>;

    async fn update_document_meta(&self, meta: DocumentMeta) -> Result<(), StoreError>;

    async fn document_meta(&self, document_id: &str) -> Result<Option<DocumentMeta>, StoreError>;
}
