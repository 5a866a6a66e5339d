pub mod chunker;
pub mod embeddings;
pub mod in_memory;
pub mod ingestion;
pub mod retriever;
pub mod sanitize;
pub mod traits;
pub mod vector;

pub use chunker::{SentenceChunks, Sentences, chunk};
pub use embeddings::{EmbeddingProvider, OpenAiEmbedding};
pub use in_memory::InMemoryDocumentStore;
pub use ingestion::{IngestReport, IngestRequest, IngestionPipeline};
pub use retriever::Retriever;
pub use sanitize::sanitize_document_text;
pub use traits::{DocumentChunk, DocumentMeta, DocumentStore, RetrievedChunk};
