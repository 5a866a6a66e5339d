use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence at or above which an objective counts as mastered.
pub const COMPLETED_THRESHOLD: f64 = 4.0;
pub const MAX_CONFIDENCE: f64 = 5.0;

/// Fixed objective ids with the evaluator's key for each.
pub const OBJECTIVES: [(&str, &str); 3] = [
    ("1", "understanding"),
    ("2", "application"),
    ("3", "transfer"),
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ObjectiveStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ObjectiveStatus {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= COMPLETED_THRESHOLD {
            Self::Completed
        } else if confidence > 0.0 {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub id: String,
    pub title: String,
    pub status: ObjectiveStatus,
    /// Smoothed mastery estimate in [0, 5]
    pub confidence: f64,
}

impl LearningObjective {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: ObjectiveStatus::NotStarted,
            confidence: 0.0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.confidence = 0.0;
        self.status = ObjectiveStatus::NotStarted;
    }
}

/// The three default objectives with titles in `locale`.
pub fn default_objectives(locale: &str) -> Vec<LearningObjective> {
    vec![
        LearningObjective::new("1", t!("progress.understanding", locale = locale)),
        LearningObjective::new("2", t!("progress.application", locale = locale)),
        LearningObjective::new("3", t!("progress.transfer", locale = locale)),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProgress {
    pub chatbot_id: String,
    pub session_id: String,
    pub objectives: Vec<LearningObjective>,
    pub last_updated: DateTime<Utc>,
}

impl LearningProgress {
    pub fn new(chatbot_id: impl Into<String>, session_id: impl Into<String>, locale: &str) -> Self {
        Self {
            chatbot_id: chatbot_id.into(),
            session_id: session_id.into(),
            objectives: default_objectives(locale),
            last_updated: Utc::now(),
        }
    }

    pub fn objective(&self, id: &str) -> Option<&LearningObjective> {
        self.objectives.iter().find(|objective| objective.id == id)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self) -> ProgressSummary {
        let mut summary = ProgressSummary::default();
        for objective in &self.objectives {
            match objective.status {
                ObjectiveStatus::Completed => summary.completed += 1,
                ObjectiveStatus::InProgress => summary.in_progress += 1,
                ObjectiveStatus::NotStarted => summary.not_started += 1,
            }
        }
        if !self.objectives.is_empty() {
            let total: f64 = self.objectives.iter().map(|o| o.confidence).sum();
            summary.overall = total / (self.objectives.len() as f64 * MAX_CONFIDENCE);
        }
        summary
    }
}

/// Partial change to one objective. At least one field should be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ObjectiveStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ObjectiveUpdate {
    pub fn confidence(target: f64) -> Self {
        Self {
            status: None,
            confidence: Some(target),
        }
    }

    pub fn status(status: ObjectiveStatus) -> Self {
        Self {
            status: Some(status),
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: ObjectiveStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Per-session roll-up for dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    /// Mean confidence scaled to [0, 1]
    pub overall: f64,
}
