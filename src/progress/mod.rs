pub mod evaluator;
pub mod store;
pub mod types;

pub use evaluator::{EvaluationOutcome, ObjectiveScore, ProgressEvaluator};
pub use store::ProgressStore;
pub use types::{
    LearningObjective, LearningProgress, ObjectiveStatus, ObjectiveUpdate, ProgressSummary,
    default_objectives,
};
