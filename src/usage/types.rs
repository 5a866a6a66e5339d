use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One billed chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: String,
    /// Chatbot / document collection the turn was grounded in
    pub collection_id: Option<String>,
    pub user_id: Option<String>,
    pub model: String,
    pub tokens_used: u64,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(model: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            collection_id: None,
            user_id: None,
            model: model.into(),
            tokens_used,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection_id: Option<&str>) -> Self {
        self.collection_id = collection_id.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }
}
