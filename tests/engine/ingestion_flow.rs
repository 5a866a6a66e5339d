use std::sync::Arc;
use std::time::{Duration, Instant};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edubot::config::IngestionConfig;
use edubot::memory::{
    DocumentStore, EmbeddingProvider, InMemoryDocumentStore, IngestRequest, IngestionPipeline,
    OpenAiEmbedding, Retriever,
};

use crate::llm_harness::{
    API_KEY, bodies_for, embedding_body, fast_client, model_config, mount_embeddings, settings,
};

fn unpaced() -> IngestionConfig {
    IngestionConfig {
        chunk_delay_ms: 0,
        batch_delay_ms: 0,
        ..IngestionConfig::default()
    }
}

fn pipeline(
    server: &MockServer,
    store: &Arc<InMemoryDocumentStore>,
    config: IngestionConfig,
) -> IngestionPipeline {
    IngestionPipeline::new(
        Arc::clone(store) as Arc<dyn DocumentStore>,
        Arc::new(OpenAiEmbedding::new(fast_client(0))) as Arc<dyn EmbeddingProvider>,
        settings(server),
        config,
    )
}

#[tokio::test]
async fn short_document_is_one_chunk_and_one_embedding_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", format!("Bearer {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[0.1, 0.2, 0.3])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryDocumentStore::new());
    store.create_collection("biology").unwrap();

    let text = "Cells split. Roots grow. Fish swim well!";
    assert_eq!(text.chars().count(), 40);

    let stored = pipeline(&server, &store, unpaced())
        .ingest(&IngestRequest::new("doc-1", "biology", text))
        .await
        .unwrap();

    assert_eq!(stored, 1);
    let meta = store.document_meta("doc-1").await.unwrap().unwrap();
    assert_eq!(meta.chunk_count, 1);
    assert_eq!(meta.collection_id, "biology");

    let bodies = bodies_for(&server, "/v1/embeddings").await;
    assert_eq!(bodies[0]["input"], text);
    assert_eq!(bodies[0]["model"], "text-embedding-3-small");
}

#[tokio::test]
async fn reingesting_replaces_chunks_instead_of_duplicating() {
    let server = MockServer::start().await;
    mount_embeddings(&server, &[1.0, 0.0]).await;

    let store = Arc::new(InMemoryDocumentStore::new());
    store.create_collection("c").unwrap();
    let pipeline = pipeline(
        &server,
        &store,
        IngestionConfig {
            max_chunk_chars: 20,
            ..unpaced()
        },
    );

    let first = "One short line here. Another line follows. And a third one.";
    assert_eq!(
        pipeline
            .ingest(&IngestRequest::new("doc", "c", first))
            .await
            .unwrap(),
        3
    );
    assert_eq!(
        pipeline
            .ingest(&IngestRequest::new("doc", "c", "Just one now."))
            .await
            .unwrap(),
        1
    );

    assert_eq!(store.chunks_for_document("doc").unwrap().len(), 1);
    assert_eq!(store.document_meta("doc").await.unwrap().unwrap().chunk_count, 1);
}

#[tokio::test]
async fn rejected_embedding_skips_chunk_but_records_meta() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("input too long"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryDocumentStore::new());
    store.create_collection("c").unwrap();

    let report = pipeline(&server, &store, unpaced())
        .ingest_with_report(&IngestRequest::new("doc", "c", "Only sentence."))
        .await
        .unwrap();

    assert_eq!(report.chunks_total, 1);
    assert_eq!(report.chunks_failed, 1);
    assert_eq!(report.chunks_stored, 0);
    assert_eq!(store.document_meta("doc").await.unwrap().unwrap().chunk_count, 0);
}

#[tokio::test]
async fn empty_collection_retrieval_makes_no_embedding_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(&[1.0])))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryDocumentStore::new());
    store.create_collection("empty").unwrap();
    let retriever = Retriever::new(
        store as Arc<dyn DocumentStore>,
        Arc::new(OpenAiEmbedding::new(fast_client(0))) as Arc<dyn EmbeddingProvider>,
    );

    let hits = retriever
        .retrieve("empty", "anything?", &model_config(&server), 3, 0.5)
        .await;
    assert!(hits.is_empty());
}

#[tokio::test]
async fn retrieval_ranks_ingested_chunks_by_similarity() {
    let server = MockServer::start().await;
    mount_embeddings(&server, &[0.6, 0.8]).await;

    let store = Arc::new(InMemoryDocumentStore::new());
    store.create_collection("c").unwrap();
    pipeline(&server, &store, unpaced())
        .ingest(&IngestRequest::new("doc", "c", "Mitochondria produce energy."))
        .await
        .unwrap();

    let retriever = Retriever::new(
        Arc::clone(&store) as Arc<dyn DocumentStore>,
        Arc::new(OpenAiEmbedding::new(fast_client(0))) as Arc<dyn EmbeddingProvider>,
    );
    let hits = retriever
        .try_retrieve("c", "What makes energy?", &model_config(&server), 3, 0.5)
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "Mitochondria produce energy.");
    assert!((hits[0].similarity - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn chunks_are_embedded_in_order_with_batch_pauses() {
    let server = MockServer::start().await;
    mount_embeddings(&server, &[1.0, 0.0]).await;

    let store = Arc::new(InMemoryDocumentStore::new());
    store.create_collection("c").unwrap();

    let sentences: Vec<String> = (1..=7).map(|n| format!("Part {n} is here.")).collect();
    let config = IngestionConfig {
        max_chunk_chars: 15,
        batch_size: 3,
        chunk_delay_ms: 20,
        batch_delay_ms: 100,
    };

    let started = Instant::now();
    let stored = pipeline(&server, &store, config)
        .ingest(&IngestRequest::new("doc", "c", sentences.join(" ")))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // Batches of 3, 3, 1: two batch pauses and four chunk pauses.
    assert_eq!(stored, 7);
    assert!(elapsed >= Duration::from_millis(2 * 100 + 4 * 20), "{elapsed:?}");

    let inputs: Vec<String> = bodies_for(&server, "/v1/embeddings")
        .await
        .iter()
        .map(|body| body["input"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(inputs, sentences);
}
