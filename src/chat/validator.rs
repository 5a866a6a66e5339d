use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ValidatorConfig};
use crate::error::ValidationParseError;
use crate::llm::{ChatMessage, ChatModel, CompletionParams, extract_json};

const VALIDATOR_TEMPERATURE: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub allow: bool,
    pub reason: String,
    /// 1–5 score from the validator model, absent when it failed open
    pub score: Option<f64>,
}

impl ValidationVerdict {
    fn fail_open(reason: impl Into<String>) -> Self {
        Self {
            allow: true,
            reason: reason.into(),
            score: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    score: f64,
    #[serde(default)]
    reason: String,
    allow: bool,
}

/// Second-opinion check of an answer against its grounding context.
///
/// Only a well-formed, negative verdict blocks an answer. Every failure
/// (transport, parse, shape) allows it.
pub struct OutputValidator {
    model: Arc<dyn ChatModel>,
    config: ValidatorConfig,
}

impl OutputValidator {
    pub fn new(model: Arc<dyn ChatModel>, config: ValidatorConfig) -> Self {
        Self { model, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn validate(
        &self,
        answer: &str,
        grounding_context: &str,
        config: &ModelConfig,
    ) -> ValidationVerdict {
        let messages = vec![
            ChatMessage::system(validation_prompt(self.config.min_score)),
            ChatMessage::user(format!(
                "Context:\n{grounding_context}\n\nAnswer to evaluate:\n{answer}"
            )),
        ];
        let params = CompletionParams::new(VALIDATOR_TEMPERATURE, self.config.max_tokens);

        let completion = match self.model.complete(&messages, &params, config).await {
            Ok(completion) => completion,
            Err(error) => {
                tracing::warn!(error = %error, "validator call failed, allowing answer");
                return ValidationVerdict::fail_open(format!("validator unavailable: {error}"));
            }
        };

        match parse_verdict(&completion.text) {
            Ok(verdict) => {
                if !verdict.allow {
                    tracing::info!(
                        score = verdict.score,
                        reason = verdict.reason.as_deref().unwrap_or_default(),
                        "validator rejected answer"
                    );
                }
                ValidationVerdict {
                    allow: verdict.allow,
                    reason: verdict.reason.unwrap_or_default(),
                    score: Some(verdict.score),
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "unparseable validator verdict, allowing answer");
                ValidationVerdict::fail_open(format!("unparseable verdict: {error}"))
            }
        }
    }
}

struct ParsedVerdict {
    score: f64,
    reason: Option<String>,
    allow: bool,
}

fn parse_verdict(text: &str) -> Result<ParsedVerdict, ValidationParseError> {
    let raw: RawVerdict = extract_json(text)?;
    if !raw.score.is_finite() || !(1.0..=5.0).contains(&raw.score) {
        return Err(ValidationParseError(format!(
            "score {} outside [1, 5]",
            raw.score
        )));
    }
    Ok(ParsedVerdict {
        score: raw.score,
        reason: Some(raw.reason).filter(|r| !r.trim().is_empty()),
        allow: raw.allow,
    })
}

fn validation_prompt(min_score: u8) -> String {
    format!(
        "You review answers given by an educational chatbot. Using the provided context, rate \
         how well the answer fits the topic and serves the learner on a scale from 1 (off-topic \
         or inappropriate) to 5 (accurate, on-topic and helpful).\n\
         Set \"allow\" to true if and only if the score is {min_score} or higher.\n\
         Respond with only this JSON object:\n\
         {{\"score\": <integer 1-5>, \"reason\": \"<one sentence>\", \"allow\": <true|false>}}"
    )
}
