use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub model: ModelSettings,

    #[serde(default)]
    pub reliability: ReliabilityConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    /// UI/response language: "en" | "de"
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            model: ModelSettings::default(),
            reliability: ReliabilityConfig::default(),
            ingestion: IngestionConfig::default(),
            retrieval: RetrievalConfig::default(),
            chat: ChatConfig::default(),
            validator: ValidatorConfig::default(),
            progress: ProgressConfig::default(),
            locale: default_locale(),
        }
    }
}

impl Config {
    /// Reject values that would make the pipeline misbehave silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.locale.as_str(), "en" | "de") {
            return Err(ConfigError::Validation(format!(
                "unsupported locale '{}' (expected en or de)",
                self.locale
            )));
        }
        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("model.base_url is empty".into()));
        }
        if self.reliability.request_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "reliability.request_timeout_ms must be positive".into(),
            ));
        }
        if self.ingestion.max_chunk_chars == 0 {
            return Err(ConfigError::Validation(
                "ingestion.max_chunk_chars must be positive".into(),
            ));
        }
        if self.ingestion.batch_size == 0 {
            return Err(ConfigError::Validation(
                "ingestion.batch_size must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_similarity) {
            return Err(ConfigError::Validation(
                "retrieval.min_similarity must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::Validation(
                "chat.temperature must be within [0, 2]".into(),
            ));
        }
        if !(1..=5).contains(&self.validator.min_score) {
            return Err(ConfigError::Validation(
                "validator.min_score must be within [1, 5]".into(),
            ));
        }
        if !self.progress.max_step.is_finite() || self.progress.max_step <= 0.0 {
            return Err(ConfigError::Validation(
                "progress.max_step must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

// ── Model / provider ────────────────────────────────────────────────────────

/// Operator-level model settings, the source of the per-turn `ModelConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Instruction prefix applied in front of every chatbot's own system prompt
    #[serde(default)]
    pub superprompt: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: default_base_url(),
            superprompt: None,
            embedding_model: default_embedding_model(),
        }
    }
}

// ── Reliability ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Hard per-attempt timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Upper bound on a server-provided `retry-after`
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_backoff_ms() -> u64 {
    1_000
}
fn default_max_backoff_ms() -> u64 {
    10_000
}
fn default_max_retry_after_secs() -> u64 {
    60
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_retry_after_secs: default_max_retry_after_secs(),
        }
    }
}

// ── Ingestion ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Max characters per chunk (single over-long sentences are kept whole)
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Chunks embedded per batch before the longer pause
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

fn default_max_chunk_chars() -> usize {
    1_000
}
fn default_batch_size() -> usize {
    3
}
fn default_chunk_delay_ms() -> u64 {
    200
}
fn default_batch_delay_ms() -> u64 {
    1_000
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            batch_size: default_batch_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

// ── Retrieval ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

fn default_top_k() -> usize {
    3
}
fn default_min_similarity() -> f32 {
    0.7
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
        }
    }
}

// ── Chat sampling ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_temperature")]
    pub temperature: f64,
    #[serde(default = "default_chat_max_tokens")]
    pub max_tokens: u32,
}

fn default_chat_temperature() -> f64 {
    0.7
}
fn default_chat_max_tokens() -> u32 {
    1_000
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            temperature: default_chat_temperature(),
            max_tokens: default_chat_max_tokens(),
        }
    }
}

// ── Output validator ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Lowest 1–5 score the validator model is told to accept
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    #[serde(default = "default_validator_max_tokens")]
    pub max_tokens: u32,
}

fn default_true() -> bool {
    true
}
fn default_min_score() -> u8 {
    3
}
fn default_validator_max_tokens() -> u32 {
    200
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_score: default_min_score(),
            max_tokens: default_validator_max_tokens(),
        }
    }
}

// ── Learning progress ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Largest confidence change a single update may apply
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    #[serde(default = "default_evaluator_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_step() -> f64 {
    1.0
}
fn default_evaluator_max_tokens() -> u32 {
    500
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_step: default_max_step(),
            max_tokens: default_evaluator_max_tokens(),
        }
    }
}
