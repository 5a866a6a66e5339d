use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Config, ModelSettings};
use crate::error::{ConfigError, EduError};

/// Model credentials and endpoint for one chat turn. Never mutated mid-turn.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    #[serde(default)]
    pub superprompt: Option<String>,
    pub embedding_model: String,
}

impl ModelConfig {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            superprompt: None,
            embedding_model: "text-embedding-3-small".into(),
        }
    }

    pub fn with_superprompt(mut self, superprompt: impl Into<String>) -> Self {
        self.superprompt = Some(superprompt.into());
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Fail fast before any network I/O when credentials are missing.
    pub fn ensure_usable(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                provider: self.provider.clone(),
            });
        }
        Ok(())
    }

    /// `{base_url}/{path}` with exactly one slash in between.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Superprompt, if it carries any text.
    pub fn active_superprompt(&self) -> Option<&str> {
        self.superprompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl From<&ModelSettings> for ModelConfig {
    fn from(settings: &ModelSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().unwrap_or_default(),
            base_url: settings.base_url.clone(),
            superprompt: settings.superprompt.clone(),
            embedding_model: settings.embedding_model.clone(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "[REDACTED]" })
            .field("base_url", &self.base_url)
            .field("superprompt", &self.superprompt.is_some())
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

/// Read-only source of the operator's model settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_config(&self) -> Result<ModelConfig, EduError>;
}

/// Settings fixed at startup (config file + env overrides).
pub struct StaticSettings {
    config: ModelConfig,
}

impl StaticSettings {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ModelConfig::from(&config.model))
    }
}

#[async_trait]
impl SettingsStore for StaticSettings {
    async fn get_config(&self) -> Result<ModelConfig, EduError> {
        Ok(self.config.clone())
    }
}
