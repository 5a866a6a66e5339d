use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use super::traits::{DocumentChunk, DocumentMeta, DocumentStore, RetrievedChunk};
use super::vector::{cosine_similarity, top_k_above};
use crate::error::StoreError;

#[derive(Default)]
struct Inner {
    collections: HashSet<String>,
    chunks: Vec<DocumentChunk>,
    meta: HashMap<String, DocumentMeta>,
}

/// Process-local document store with brute-force cosine search.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection so documents can be ingested into it.
    pub fn create_collection(&self, collection_id: impl Into<String>) -> Result<(), StoreError> {
        self.write()?.collections.insert(collection_id.into());
        Ok(())
    }

    pub fn chunks_for_document(&self, document_id: &str) -> Result<Vec<DocumentChunk>, StoreError> {
        Ok(self
            .read()?
            .chunks
            .iter()
            .filter(|chunk| chunk.document_id == document_id)
            .cloned()
            .collect())
    }

    pub fn chunk_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.chunks.len())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Backend(format!("lock error: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Backend(format!("lock error: {e}")))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn collection_exists(&self, collection_id: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.collections.contains(collection_id))
    }

    async fn has_embedded_chunks(&self, collection_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .read()?
            .chunks
            .iter()
            .any(|chunk| chunk.collection_id == collection_id && chunk.embedding.is_some()))
    }

    async fn delete_document_chunks(&self, document_id: &str) -> Result<usize, StoreError> {
        let mut inner = self.write()?;
        let before = inner.chunks.len();
        inner.chunks.retain(|chunk| chunk.document_id != document_id);
        Ok(before - inner.chunks.len())
    }

    async fn insert_chunk(&self, chunk: DocumentChunk) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.collections.contains(&chunk.collection_id) {
            return Err(StoreError::CollectionNotFound(chunk.collection_id));
        }
        inner.chunks.push(chunk);
        Ok(())
    }

    async fn similarity_search(
        &self,
        collection_id: &str,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let inner = self.read()?;
        let scored: Vec<(&str, f32)> = inner
            .chunks
            .iter()
            .filter(|chunk| chunk.collection_id == collection_id)
            .filter_map(|chunk| {
                let embedding = chunk.embedding.as_deref()?;
                Some((chunk.content.as_str(), cosine_similarity(query, embedding)))
            })
            .collect();

        Ok(top_k_above(scored, threshold, limit)
            .into_iter()
            .map(|(content, similarity)| RetrievedChunk {
                content: content.to_string(),
                similarity,
            })
            .collect())
    }

    async fn update_document_meta(&self, meta: DocumentMeta) -> Result<(), StoreError> {
        self.write()?.meta.insert(meta.document_id.clone(), meta);
        Ok(())
    }

    async fn document_meta(&self, document_id: &str) -> Result<Option<DocumentMeta>, StoreError> {
        Ok(self.read()?.meta.get(document_id).cloned())
    }
}
