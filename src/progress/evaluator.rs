use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::store::ProgressStore;
use super::types::{MAX_CONFIDENCE, OBJECTIVES, ObjectiveUpdate};
use crate::config::{ModelConfig, ProgressConfig};
use crate::error::{EduError, ValidationParseError};
use crate::llm::{ChatMessage, ChatModel, CompletionParams, extract_json};

const EVALUATOR_TEMPERATURE: f64 = 0.0;

const EVALUATION_PROMPT: &str = r#"You are a learning progress evaluator. Analyze the conversation and evaluate the learner's progress in three areas, each on a scale from 0 to 5:

"1" Basic understanding: comprehension of core concepts, explaining ideas in their own words, quality of questions, engagement with the material.
"2" Practical application: attempts to apply concepts, problem solving, quality of completed exercises, improvement over time.
"3" Deepening & transfer: connections to other topics, critical thinking, understanding of relationships, extending concepts.

Respond with a single JSON object in exactly this format and nothing else:
{
  "1": {"score": <number 0-5>, "reason": "<brief explanation>"},
  "2": {"score": <number 0-5>, "reason": "<brief explanation>"},
  "3": {"score": <number 0-5>, "reason": "<brief explanation>"}
}"#;

#[derive(Debug, Clone, Deserialize)]
struct RawScore {
    score: f64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveScore {
    pub objective_id: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// Scores were parsed and applied as smoothed confidence updates.
    Applied(Vec<ObjectiveScore>),
    /// The evaluation failed; all objectives were reset to confidence 0.
    Reset { reason: String },
    /// Disabled, or the session was never initialized.
    Skipped,
}

/// Scores a transcript against the fixed objectives and feeds the result
/// into the [`ProgressStore`]. Never fails the enclosing chat turn.
pub struct ProgressEvaluator {
    model: Arc<dyn ChatModel>,
    store: Arc<ProgressStore>,
    config: ProgressConfig,
}

impl ProgressEvaluator {
    pub fn new(model: Arc<dyn ChatModel>, store: Arc<ProgressStore>, config: ProgressConfig) -> Self {
        Self {
            model,
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    pub async fn evaluate(
        &self,
        session_id: &str,
        transcript: &[ChatMessage],
        config: &ModelConfig,
    ) -> EvaluationOutcome {
        if !self.config.enabled {
            return EvaluationOutcome::Skipped;
        }
        if !self.store.is_initialized(session_id) {
            tracing::warn!(session_id, "skipping progress evaluation: session not initialized");
            return EvaluationOutcome::Skipped;
        }

        let scores = match self.request_scores(transcript, config).await {
            Ok(scores) => scores,
            Err(reason) => {
                tracing::warn!(session_id, %reason, "progress evaluation failed, resetting objectives");
                self.store.reset_objectives(session_id);
                return EvaluationOutcome::Reset { reason };
            }
        };

        for score in &scores {
            if !self.store.update(
                session_id,
                &score.objective_id,
                ObjectiveUpdate::confidence(score.score),
            ) {
                tracing::warn!(
                    session_id,
                    objective_id = %score.objective_id,
                    "failed to apply objective score"
                );
            }
        }

        tracing::debug!(session_id, objectives = scores.len(), "progress evaluated");
        EvaluationOutcome::Applied(scores)
    }

    async fn request_scores(
        &self,
        transcript: &[ChatMessage],
        config: &ModelConfig,
    ) -> Result<Vec<ObjectiveScore>, String> {
        let messages = build_evaluation_messages(transcript).map_err(|e| e.to_string())?;
        let params = CompletionParams::new(EVALUATOR_TEMPERATURE, self.config.max_tokens);

        let completion = self
            .model
            .complete(&messages, &params, config)
            .await
            .map_err(|e| e.to_string())?;

        parse_scores(&completion.text).map_err(|e| e.to_string())
    }
}

fn build_evaluation_messages(transcript: &[ChatMessage]) -> Result<Vec<ChatMessage>, EduError> {
    let conversation = serde_json::to_string_pretty(&serde_json::json!({ "messages": transcript }))
        .map_err(|e| EduError::Other(anyhow::anyhow!("encode transcript: {e}")))?;
    Ok(vec![
        ChatMessage::system(EVALUATION_PROMPT),
        ChatMessage::user(conversation),
    ])
}

/// Parse one score per fixed objective. Accepts either the objective ids or
/// their area names as keys. Any missing or out-of-range score rejects the
/// whole evaluation.
fn parse_scores(text: &str) -> Result<Vec<ObjectiveScore>, ValidationParseError> {
    let raw: HashMap<String, RawScore> = extract_json(text)?;

    OBJECTIVES
        .iter()
        .map(|(id, area)| {
            let entry = raw
                .get(*id)
                .or_else(|| raw.get(*area))
                .ok_or_else(|| ValidationParseError(format!("missing score for objective {id}")))?;
            if !entry.score.is_finite() || !(0.0..=MAX_CONFIDENCE).contains(&entry.score) {
                return Err(ValidationParseError(format!(
                    "score {} for objective {id} outside [0, 5]",
                    entry.score
                )));
            }
            Ok(ObjectiveScore {
                objective_id: (*id).to_string(),
                score: entry.score,
                reason: entry.reason.clone(),
            })
        })
        .collect()
}
