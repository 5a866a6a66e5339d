use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::chat::{ChatOrchestrator, ChatSession, OutputValidator};
use crate::config::{Config, SettingsStore, StaticSettings};
use crate::llm::{ChatModel, OpenAiChatModel, ResilientClient};
use crate::memory::{
    DocumentStore, EmbeddingProvider, InMemoryDocumentStore, IngestRequest, IngestionPipeline,
    OpenAiEmbedding, Retriever,
};
use crate::progress::{ProgressEvaluator, ProgressStore};
use crate::usage::{TracingUsageSink, UsageSink};

/// Fully wired engine for one process: shared HTTP client, in-memory
/// document store, chat orchestration and progress tracking.
pub struct Tutor {
    store: Arc<InMemoryDocumentStore>,
    pipeline: IngestionPipeline,
    orchestrator: Arc<ChatOrchestrator>,
    evaluator: Option<Arc<ProgressEvaluator>>,
    settings: Arc<dyn SettingsStore>,
}

impl Tutor {
    pub fn from_config(config: &Config) -> Self {
        let client = Arc::new(ResilientClient::new(&config.reliability));
        let settings: Arc<dyn SettingsStore> = Arc::new(StaticSettings::from_config(config));
        Self::with_client(config, client, settings)
    }

    pub fn with_client(
        config: &Config,
        client: Arc<ResilientClient>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(Arc::clone(&client)));
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedding::new(client));
        let store = Arc::new(InMemoryDocumentStore::new());
        let document_store = Arc::clone(&store) as Arc<dyn DocumentStore>;

        let pipeline = IngestionPipeline::new(
            Arc::clone(&document_store),
            Arc::clone(&embedder),
            Arc::clone(&settings),
            config.ingestion.clone(),
        );

        let validator = config.validator.enabled.then(|| {
            Arc::new(OutputValidator::new(
                Arc::clone(&model),
                config.validator.clone(),
            ))
        });

        let orchestrator = ChatOrchestrator::new(
            Arc::clone(&model),
            Arc::new(Retriever::new(document_store, embedder)),
            validator,
            Arc::new(TracingUsageSink) as Arc<dyn UsageSink>,
        )
        .with_chat_config(config.chat.clone())
        .with_retrieval_config(config.retrieval.clone())
        .with_locale(config.locale.clone());

        let evaluator = config.progress.enabled.then(|| {
            Arc::new(ProgressEvaluator::new(
                model,
                Arc::new(ProgressStore::from_config(&config.progress, &config.locale)),
                config.progress.clone(),
            ))
        });

        Self {
            store,
            pipeline,
            orchestrator: Arc::new(orchestrator),
            evaluator,
            settings,
        }
    }

    pub fn locale(&self) -> &str {
        self.orchestrator.locale()
    }

    /// Read a text file and ingest it into `collection_id`, creating the
    /// collection on first use. The file name is the document id.
    pub async fn ingest_file(&self, collection_id: &str, path: &Path) -> Result<usize> {
        self.store.create_collection(collection_id)?;

        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document_id = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());

        let stored = self
            .pipeline
            .ingest(&IngestRequest::new(document_id, collection_id, text))
            .await?;
        Ok(stored)
    }

    /// New session grounded in `collection_id`, with progress tracking when enabled.
    pub fn session(&self, system_prompt: Option<&str>, collection_id: &str) -> ChatSession {
        let session = ChatSession::new(
            "cli",
            system_prompt,
            Arc::clone(&self.orchestrator),
            Arc::clone(&self.settings),
        )
        .with_collection(collection_id);

        match &self.evaluator {
            Some(evaluator) => session.with_progress(Arc::clone(evaluator)),
            None => session,
        }
    }
}
