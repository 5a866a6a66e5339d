// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod json;
pub mod reliable;
pub mod scrub;
pub mod types;

// ── Models ──────────────────────────────────────────────────────────────────
pub mod chat;

pub use chat::{ChatModel, OpenAiChatModel};
pub use http_client::build_model_client_with_timeout;
pub use json::extract_json;
pub use reliable::ResilientClient;
pub use scrub::{sanitize_upstream_body, scrub_secret_patterns};
pub use types::{ChatCompletion, ChatMessage, CompletionParams, MessageRole};
