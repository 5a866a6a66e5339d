use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edubot::EduError;
use edubot::app::Tutor;
use edubot::chat::{ChatOrchestrator, OutputValidator};
use edubot::config::{SettingsStore, StaticSettings, ValidatorConfig};
use edubot::llm::{ChatMessage, ChatModel, OpenAiChatModel};
use edubot::memory::{
    DocumentStore, EmbeddingProvider, InMemoryDocumentStore, OpenAiEmbedding, Retriever,
};
use edubot::progress::ObjectiveStatus;
use edubot::usage::{InMemoryUsageSink, UsageSink};

use crate::llm_harness::{
    VALIDATOR_MARKER, bodies_for, chat_body, engine_config, fast_client, model_config,
    mount_answer, mount_embeddings, mount_evaluator, settings,
};

const EVALUATION: &str = r#"{"1": {"score": 3, "reason": "clear question"}, "2": {"score": 0, "reason": ""}, "3": {"score": 0, "reason": ""}}"#;

async fn mount_validator(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(VALIDATOR_MARKER))
        .respond_with(template)
        .with_priority(1)
        .mount(server)
        .await;
}

fn verdict(score: u8, allow: bool) -> ResponseTemplate {
    let text = json!({"score": score, "reason": "checked", "allow": allow}).to_string();
    ResponseTemplate::new(200).set_body_json(chat_body(&text, 7))
}

async fn tutor_with_notes(server: &MockServer, notes: &str) -> (Tutor, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("cells.txt");
    std::fs::write(&file, notes).unwrap();

    let settings: Arc<dyn SettingsStore> =
        Arc::new(StaticSettings::from_config(&engine_config(server)));
    let tutor = Tutor::with_client(&engine_config(server), fast_client(0), settings);
    tutor.ingest_file("biology", &file).await.unwrap();
    (tutor, dir)
}

#[tokio::test]
async fn ungrounded_turn_skips_retrieval_and_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    mount_answer(&server, "Photosynthesis turns light into sugar.", 42).await;

    let client = fast_client(0);
    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(Arc::clone(&client)));
    let usage = Arc::new(InMemoryUsageSink::new());
    let orchestrator = ChatOrchestrator::new(
        Arc::clone(&model),
        Arc::new(Retriever::new(
            Arc::new(InMemoryDocumentStore::new()) as Arc<dyn DocumentStore>,
            Arc::new(OpenAiEmbedding::new(client)) as Arc<dyn EmbeddingProvider>,
        )),
        Some(Arc::new(OutputValidator::new(model, ValidatorConfig::default()))),
        Arc::clone(&usage) as Arc<dyn UsageSink>,
    );

    let reply = orchestrator
        .respond(
            &[ChatMessage::system("You are a biology tutor.")],
            "What is photosynthesis?",
            &model_config(&server),
            None,
        )
        .await
        .unwrap();

    assert_eq!(reply.text, "Photosynthesis turns light into sugar.");
    assert_eq!(reply.tokens_used, 42);
    assert_eq!(reply.context_chunks, 0);
    assert!(reply.validation.is_none());

    let chats = bodies_for(&server, "/v1/chat/completions").await;
    assert_eq!(chats.len(), 1);
    let messages = chats[0]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");

    let records = usage.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tokens_used, 42);
    assert!(records[0].collection_id.is_none());
}

#[tokio::test]
async fn grounded_turn_splices_context_validates_and_tracks_progress() {
    let server = MockServer::start().await;
    mount_embeddings(&server, &[0.3, 0.4]).await;
    mount_evaluator(&server, EVALUATION).await;
    mount_validator(&server, verdict(5, true)).await;
    mount_answer(&server, "Cells are the smallest unit of life.", 30).await;

    let (tutor, _dir) = tutor_with_notes(&server, "Cells are the basic unit of life.").await;
    let mut session = tutor.session(Some("You are a biology tutor."), "biology");

    let reply = session.send("What is a cell?").await.unwrap();
    assert_eq!(reply.text, "Cells are the smallest unit of life.");
    assert_eq!(reply.context_chunks, 1);
    let validation = reply.validation.unwrap();
    assert!(validation.allow);
    assert_eq!(validation.score, Some(5.0));

    let chats = bodies_for(&server, "/v1/chat/completions").await;
    let answer_request = &chats[0]["messages"];
    assert_eq!(answer_request[0]["content"], "You are a biology tutor.");
    assert_eq!(answer_request[1]["role"], "system");
    assert!(
        answer_request[1]["content"]
            .as_str()
            .unwrap()
            .ends_with("Cells are the basic unit of life.")
    );
    assert_eq!(answer_request[2]["content"], "What is a cell?");

    let progress = session.progress().unwrap();
    let understanding = progress.objective("1").unwrap();
    assert!((understanding.confidence - 1.0).abs() < 1e-9);
    assert_eq!(understanding.status, ObjectiveStatus::InProgress);
    assert_eq!(
        progress.objective("2").unwrap().status,
        ObjectiveStatus::NotStarted
    );
}

#[tokio::test]
async fn rejected_answer_is_replaced_by_refusal() {
    let server = MockServer::start().await;
    mount_embeddings(&server, &[0.3, 0.4]).await;
    mount_evaluator(&server, EVALUATION).await;
    mount_validator(&server, verdict(1, false)).await;
    mount_answer(&server, "Let me tell you about cryptocurrency instead.", 25).await;

    let (tutor, _dir) = tutor_with_notes(&server, "Cells are the basic unit of life.").await;
    let mut session = tutor.session(None, "biology");

    let reply = session.send("What is a cell?").await.unwrap();
    assert!(reply.text.starts_with("I'm sorry"));
    assert!(!reply.text.contains("cryptocurrency"));
    assert_eq!(reply.tokens_used, 25);
    assert!(!reply.validation.unwrap().allow);
    assert_eq!(session.transcript()[1].content, reply.text);
}

#[tokio::test]
async fn validator_outage_fails_open() {
    let server = MockServer::start().await;
    mount_embeddings(&server, &[0.3, 0.4]).await;
    mount_evaluator(&server, EVALUATION).await;
    mount_validator(&server, ResponseTemplate::new(503)).await;
    mount_answer(&server, "A cell is the basic unit of life.", 12).await;

    let (tutor, _dir) = tutor_with_notes(&server, "Cells are the basic unit of life.").await;
    let mut session = tutor.session(None, "biology");

    let reply = session.send("What is a cell?").await.unwrap();
    assert_eq!(reply.text, "A cell is the basic unit of life.");
    let validation = reply.validation.unwrap();
    assert!(validation.allow);
    assert!(validation.score.is_none());
}

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    let mut config = engine_config(&server);
    config.model.api_key = None;

    let settings: Arc<dyn SettingsStore> = Arc::new(StaticSettings::from_config(&config));
    let tutor = Tutor::with_client(&config, fast_client(0), settings);
    let mut session = tutor.session(None, "biology");

    let err = session.send("Hello?").await.unwrap_err();
    assert!(matches!(err, EduError::Config(_)));
    assert!(err.user_message("de").contains("nicht korrekt konfiguriert"));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn auth_rejection_surfaces_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server);
    let tutor = Tutor::with_client(&engine_config(&server), fast_client(3), settings);
    let mut session = tutor.session(None, "nothing-ingested");

    let err = session.send("Hello?").await.unwrap_err();
    assert!(matches!(
        err,
        EduError::Request(edubot::error::RequestError::Auth { status: 401 })
    ));
    assert!(err.user_message("en").contains("credentials"));
}
