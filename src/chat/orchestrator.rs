use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::validator::{OutputValidator, ValidationVerdict};
use crate::config::{ChatConfig, ModelConfig, RetrievalConfig};
use crate::error::EduError;
use crate::llm::{ChatMessage, ChatModel, CompletionParams, MessageRole};
use crate::memory::Retriever;
use crate::usage::{UsageRecord, UsageSink};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    /// `usage.total_tokens` of the answering call, also when the answer was replaced
    pub tokens_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationVerdict>,
    /// Retrieved chunks spliced into the prompt
    pub context_chunks: usize,
}

/// One chat turn: retrieval, prompt assembly, model call, output gating.
pub struct ChatOrchestrator {
    model: Arc<dyn ChatModel>,
    retriever: Arc<Retriever>,
    validator: Option<Arc<OutputValidator>>,
    usage: Arc<dyn UsageSink>,
    chat: ChatConfig,
    retrieval: RetrievalConfig,
    locale: String,
}

impl ChatOrchestrator {
    pub fn new(
        model: Arc<dyn ChatModel>,
        retriever: Arc<Retriever>,
        validator: Option<Arc<OutputValidator>>,
        usage: Arc<dyn UsageSink>,
    ) -> Self {
        Self {
            model,
            retriever,
            validator,
            usage,
            chat: ChatConfig::default(),
            retrieval: RetrievalConfig::default(),
            locale: "en".into(),
        }
    }

    #[must_use]
    pub fn with_chat_config(mut self, chat: ChatConfig) -> Self {
        self.chat = chat;
        self
    }

    #[must_use]
    pub fn with_retrieval_config(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub async fn respond(
        &self,
        history: &[ChatMessage],
        new_user_text: &str,
        config: &ModelConfig,
        collection_id: Option<&str>,
    ) -> Result<ChatReply, EduError> {
        self.respond_as(history, new_user_text, config, collection_id, None)
            .await
    }

    /// [`respond`](Self::respond), attributing usage to `user_id`.
    pub async fn respond_as(
        &self,
        history: &[ChatMessage],
        new_user_text: &str,
        config: &ModelConfig,
        collection_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<ChatReply, EduError> {
        config.ensure_usable()?;

        let mut messages = history.to_vec();

        let mut context_chunks = 0;
        let mut grounding = None;
        if let Some(collection_id) = collection_id {
            let chunks = self
                .retriever
                .retrieve(
                    collection_id,
                    new_user_text,
                    config,
                    self.retrieval.top_k,
                    self.retrieval.min_similarity,
                )
                .await;
            if !chunks.is_empty() {
                context_chunks = chunks.len();
                let joined = chunks
                    .iter()
                    .map(|chunk| chunk.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                let preface = t!("chat.grounding_preface", locale = self.locale.as_str());
                let context = format!("{preface}\n\n{joined}");
                messages.push(ChatMessage::system(context.clone()));
                grounding = Some(joined);
            }
        }

        messages.push(ChatMessage::user(new_user_text));

        // Operator instructions always precede the chatbot's own.
        if let Some(superprompt) = config.active_superprompt()
            && let Some(first) = messages.first_mut()
            && first.role == MessageRole::System
        {
            first.content = format!("{superprompt}\n\n{}", first.content);
        }

        let params = CompletionParams::new(self.chat.temperature, self.chat.max_tokens);
        let completion = self.model.complete(&messages, &params, config).await?;

        let mut text = completion.text;
        let mut validation = None;
        if let Some(grounding) = grounding.as_deref()
            && let Some(validator) = self.validator.as_ref().filter(|v| v.is_enabled())
        {
            let verdict = validator.validate(&text, grounding, config).await;
            if !verdict.allow {
                text = t!("chat.refusal", locale = self.locale.as_str()).into_owned();
            }
            validation = Some(verdict);
        }

        let record = UsageRecord::new(config.model.as_str(), completion.total_tokens)
            .with_collection(collection_id)
            .with_user(user_id);
        if let Err(error) = self.usage.record(record).await {
            tracing::warn!(error = %error, "failed to record usage");
        }

        tracing::debug!(
            model = %config.model,
            tokens_used = completion.total_tokens,
            context_chunks,
            validated = validation.is_some(),
            "chat turn completed"
        );

        Ok(ChatReply {
            text,
            tokens_used: completion.total_tokens,
            validation,
            context_chunks,
        })
    }
}
