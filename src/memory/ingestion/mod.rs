mod pipeline;

pub use pipeline::{IngestReport, IngestRequest, IngestionPipeline};
