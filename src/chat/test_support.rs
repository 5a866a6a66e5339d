use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::error::{EduError, RequestError};
use crate::llm::{ChatCompletion, ChatMessage, ChatModel, CompletionParams};

/// Chat model that replays canned replies and records what it was sent.
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    params: Mutex<Vec<CompletionParams>>,
    fail: bool,
    tokens_per_call: u64,
}

impl ScriptedModel {
    pub(crate) fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| (*r).to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
            fail: false,
            tokens_per_call: 10,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying(&[])
        }
    }

    pub(crate) fn with_tokens(mut self, tokens_per_call: u64) -> Self {
        self.tokens_per_call = tokens_per_call;
        self
    }

    pub(crate) fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn params(&self) -> Vec<CompletionParams> {
        self.params.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted_test"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
        _config: &ModelConfig,
    ) -> Result<ChatCompletion, EduError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.params.lock().unwrap().push(*params);

        if self.fail {
            return Err(RequestError::Upstream {
                status: 500,
                body: "scripted failure".into(),
            }
            .into());
        }

        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EduError::MalformedResponse("script exhausted".into()))?;

        Ok(ChatCompletion {
            text,
            total_tokens: self.tokens_per_call,
            model: Some("scripted".into()),
        })
    }
}
