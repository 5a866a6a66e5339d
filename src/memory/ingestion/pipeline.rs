use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::{IngestionConfig, ModelConfig, SettingsStore};
use crate::error::{EduError, StoreError};
use crate::memory::chunker::chunk;
use crate::memory::embeddings::EmbeddingProvider;
use crate::memory::sanitize::sanitize_document_text;
use crate::memory::traits::{DocumentChunk, DocumentMeta, DocumentStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub document_id: String,
    pub collection_id: String,
    pub text: String,
}

impl IngestRequest {
    pub fn new(
        document_id: impl Into<String>,
        collection_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            collection_id: collection_id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub chunks_total: usize,
    pub chunks_stored: usize,
    pub chunks_failed: usize,
}

/// Document → chunks → vectors → store.
///
/// Chunks are embedded one at a time, in batches separated by a longer pause,
/// so a large upload stays under provider rate limits. A chunk that fails to
/// embed or persist is logged and skipped.
pub struct IngestionPipeline {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: Arc<dyn SettingsStore>,
    config: IngestionConfig,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        settings: Arc<dyn SettingsStore>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            settings,
            config,
        }
    }

    /// Ingest a document, returning the number of chunks stored.
    pub async fn ingest(&self, request: &IngestRequest) -> Result<usize, EduError> {
        self.ingest_with_report(request)
            .await
            .map(|report| report.chunks_stored)
    }

    pub async fn ingest_with_report(&self, request: &IngestRequest) -> Result<IngestReport, EduError> {
        let model = self.settings.get_config().await?;
        model.ensure_usable()?;

        if !self.store.collection_exists(&request.collection_id).await? {
            return Err(StoreError::CollectionNotFound(request.collection_id.clone()).into());
        }

        let removed = self
            .store
            .delete_document_chunks(&request.document_id)
            .await?;
        if removed > 0 {
            tracing::debug!(
                document_id = %request.document_id,
                removed,
                "removed stale chunks before re-ingestion"
            );
        }

        let text = sanitize_document_text(&request.text);
        let chunks: Vec<String> = chunk(&text, self.config.max_chunk_chars).collect();

        let mut report = IngestReport {
            chunks_total: chunks.len(),
            ..IngestReport::default()
        };

        let batch_size = self.config.batch_size.max(1);
        for (batch_index, batch) in chunks.chunks(batch_size).enumerate() {
            if batch_index > 0 {
                sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }

            for (offset, content) in batch.iter().enumerate() {
                if offset > 0 {
                    sleep(Duration::from_millis(self.config.chunk_delay_ms)).await;
                }

                let index = batch_index * batch_size + offset;
                match self.store_chunk(request, content, &model).await {
                    Ok(()) => report.chunks_stored += 1,
                    Err(error) => {
                        report.chunks_failed += 1;
                        tracing::warn!(
                            document_id = %request.document_id,
                            chunk_index = index,
                            error = %error,
                            "skipping chunk that failed to embed or persist"
                        );
                    }
                }
            }
        }

        self.store
            .update_document_meta(DocumentMeta {
                document_id: request.document_id.clone(),
                collection_id: request.collection_id.clone(),
                chunk_count: report.chunks_stored,
                updated_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            document_id = %request.document_id,
            collection_id = %request.collection_id,
            chunks_total = report.chunks_total,
            chunks_stored = report.chunks_stored,
            chunks_failed = report.chunks_failed,
            "document ingested"
        );

        Ok(report)
    }

    async fn store_chunk(
        &self,
        request: &IngestRequest,
        content: &str,
        model: &ModelConfig,
    ) -> Result<(), EduError> {
        let embedding = self.embedder.embed(content, model).await?;
        self.store
            .insert_chunk(DocumentChunk::new(
                request.document_id.as_str(),
                request.collection_id.as_str(),
                content,
                Some(embedding),
            ))
            .await?;
        Ok(())
    }
}
