pub mod env_overrides;
pub mod loader;
pub mod schema;
pub mod settings;


pub use schema::{
    ChatConfig, Config, IngestionConfig, ModelSettings, ProgressConfig, ReliabilityConfig,
    RetrievalConfig, ValidatorConfig,
};
pub use settings::{ModelConfig, SettingsStore, StaticSettings};
