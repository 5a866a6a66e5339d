use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `edubot`.
///
/// Transient request failures are retried inside the resilient client before
/// they ever reach this type. What remains is either a caller-facing failure
/// of the chat turn (bad configuration, rejected credentials, malformed model
/// output) or an infrastructure failure of a collaborator.
#[derive(Debug, Error)]
pub enum EduError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Outbound HTTP ───────────────────────────────────────────────────
    #[error("request: {0}")]
    Request(#[from] RequestError),

    // ── Embeddings ──────────────────────────────────────────────────────
    #[error("embedding failed: {0}")]
    Embedding(String),

    // ── Model output ────────────────────────────────────────────────────
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    // ── Document / vector store ─────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EduError {
    /// Whether retrying the whole operation later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Single presentable message for the end user of a chat turn.
    pub fn user_message(&self, locale: &str) -> String {
        let message = match self {
            Self::Config(_) => t!("errors.config", locale = locale),
            Self::Request(RequestError::Auth { .. }) => t!("errors.auth", locale = locale),
            Self::Request(RequestError::RateLimited { .. }) => t!("errors.busy", locale = locale),
            Self::Request(RequestError::Timeout { .. } | RequestError::Network(_)) => {
                t!("errors.unreachable", locale = locale)
            }
            Self::MalformedResponse(_) => t!("errors.malformed", locale = locale),
            Self::Request(RequestError::Upstream { .. })
            | Self::Embedding(_)
            | Self::Store(_)
            | Self::Other(_) => t!("errors.generic", locale = locale),
        };
        message.into_owned()
    }
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API key configured for provider {provider}")]
    MissingApiKey { provider: String },

    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Request errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("rate-limited (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication rejected by upstream (HTTP {status})")]
    Auth { status: u16 },

    #[error("upstream error (HTTP {status}): {body}")]
    Upstream { status: u16, body: String },
}

impl RequestError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::Auth { .. } => false,
        }
    }
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("backend: {0}")]
    Backend(String),
}

// ─── Model-output parse failures ─────────────────────────────────────────────

/// Raised while decoding a validator or evaluator reply. Never leaves the
/// subsystem that produced it; callers fall back to a safe default instead.
#[derive(Debug, Error)]
#[error("could not parse model verdict: {0}")]
pub struct ValidationParseError(pub String);

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, EduError>;
