use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::types::UsageRecord;

/// Destination for per-turn token accounting.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, record: UsageRecord) -> Result<()>;
}

/// Emits each record as a structured log line.
pub struct TracingUsageSink;

#[async_trait]
impl UsageSink for TracingUsageSink {
    async fn record(&self, record: UsageRecord) -> Result<()> {
        tracing::info!(
            target: "edubot::usage",
            id = %record.id,
            collection_id = record.collection_id.as_deref().unwrap_or("-"),
            user_id = record.user_id.as_deref().unwrap_or("-"),
            model = %record.model,
            tokens_used = record.tokens_used,
            "usage recorded"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUsageSink {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Result<Vec<UsageRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {e}"))?;
        Ok(records.clone())
    }
}

#[async_trait]
impl UsageSink for InMemoryUsageSink {
    async fn record(&self, record: UsageRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {e}"))?
            .push(record);
        Ok(())
    }
}
