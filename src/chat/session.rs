use std::sync::Arc;

use super::orchestrator::{ChatOrchestrator, ChatReply};
use crate::config::SettingsStore;
use crate::error::EduError;
use crate::llm::{ChatMessage, MessageRole};
use crate::progress::{EvaluationOutcome, LearningProgress, ProgressEvaluator};

/// A single learner's conversation with one chatbot.
///
/// Owns the transcript, runs each turn through the orchestrator and then
/// re-evaluates learning progress. Turns must not overlap.
pub struct ChatSession {
    session_id: String,
    chatbot_id: String,
    collection_id: Option<String>,
    user_id: Option<String>,
    transcript: Vec<ChatMessage>,
    orchestrator: Arc<ChatOrchestrator>,
    settings: Arc<dyn SettingsStore>,
    evaluator: Option<Arc<ProgressEvaluator>>,
}

impl ChatSession {
    pub fn new(
        chatbot_id: impl Into<String>,
        system_prompt: Option<&str>,
        orchestrator: Arc<ChatOrchestrator>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let transcript = system_prompt
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .map(|prompt| vec![ChatMessage::system(prompt)])
            .unwrap_or_default();

        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            chatbot_id: chatbot_id.into(),
            collection_id: None,
            user_id: None,
            transcript,
            orchestrator,
            settings,
            evaluator: None,
        }
    }

    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Ground answers in this document collection.
    #[must_use]
    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Track learning progress for this session.
    #[must_use]
    pub fn with_progress(mut self, evaluator: Arc<ProgressEvaluator>) -> Self {
        evaluator
            .store()
            .init_session(&self.chatbot_id, &self.session_id);
        self.evaluator = Some(evaluator);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn progress(&self) -> Option<LearningProgress> {
        self.evaluator
            .as_ref()
            .and_then(|evaluator| evaluator.store().get_progress(&self.session_id))
    }

    /// Run one turn. On error the transcript is left unchanged.
    pub async fn send(&mut self, text: &str) -> Result<ChatReply, EduError> {
        let config = self.settings.get_config().await?;

        let reply = self
            .orchestrator
            .respond_as(
                &self.transcript,
                text,
                &config,
                self.collection_id.as_deref(),
                self.user_id.as_deref(),
            )
            .await?;

        self.transcript.push(ChatMessage::user(text));
        self.transcript.push(ChatMessage::assistant(reply.text.clone()));

        if let Some(evaluator) = &self.evaluator {
            let conversation: Vec<ChatMessage> = self
                .transcript
                .iter()
                .filter(|message| message.role != MessageRole::System)
                .cloned()
                .collect();
            if let EvaluationOutcome::Reset { reason } = evaluator
                .evaluate(&self.session_id, &conversation, &config)
                .await
            {
                tracing::debug!(session_id = %self.session_id, %reason, "progress reset after turn");
            }
        }

        Ok(reply)
    }
}
