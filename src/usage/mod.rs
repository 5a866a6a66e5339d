pub mod tracker;
pub mod types;

pub use tracker::{InMemoryUsageSink, TracingUsageSink, UsageSink};
pub use types::UsageRecord;
