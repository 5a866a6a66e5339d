use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;

use super::types::{LearningProgress, MAX_CONFIDENCE, ObjectiveStatus, ObjectiveUpdate};
use crate::config::ProgressConfig;

/// Per-session learning progress, keyed by session id.
///
/// Concurrent turns for different sessions are independent. Turns for the
/// same session must be serialized by the caller.
pub struct ProgressStore {
    sessions: RwLock<HashMap<String, LearningProgress>>,
    max_step: f64,
    locale: String,
}

impl ProgressStore {
    pub fn new(max_step: f64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_step: if max_step.is_finite() && max_step > 0.0 {
                max_step
            } else {
                1.0
            },
            locale: "en".into(),
        }
    }

    pub fn from_config(config: &ProgressConfig, locale: &str) -> Self {
        Self::new(config.max_step).with_locale(locale)
    }

    /// Locale for objective titles of sessions created from now on.
    #[must_use]
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    /// Seed a session with the default objectives. Idempotent: an existing
    /// session is returned unchanged.
    pub fn init_session(&self, chatbot_id: &str, session_id: &str) -> LearningProgress {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| LearningProgress::new(chatbot_id, session_id, &self.locale))
            .clone()
    }

    pub fn get_progress(&self, session_id: &str) -> Option<LearningProgress> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    pub fn is_initialized(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(session_id)
    }

    /// Apply a smoothed update to one objective.
    ///
    /// Returns `false` without mutating anything for an unknown session or
    /// objective, or a confidence target outside [0, 5].
    pub fn update(&self, session_id: &str, objective_id: &str, update: ObjectiveUpdate) -> bool {
        if let Some(target) = update.confidence
            && !(target.is_finite() && (0.0..=MAX_CONFIDENCE).contains(&target))
        {
            tracing::warn!(session_id, objective_id, target, "rejecting out-of-range confidence");
            return false;
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(progress) = sessions.get_mut(session_id) else {
            tracing::warn!(session_id, "cannot update objective: session not initialized");
            return false;
        };
        let Some(objective) = progress
            .objectives
            .iter_mut()
            .find(|objective| objective.id == objective_id)
        else {
            tracing::warn!(session_id, objective_id, "cannot update objective: unknown id");
            return false;
        };

        if let Some(target) = update.confidence {
            objective.confidence = smooth(objective.confidence, target, self.max_step);
            objective.status = ObjectiveStatus::from_confidence(objective.confidence);
        }
        if let Some(status) = update.status {
            objective.status = status;
        }

        progress.last_updated = Utc::now();
        true
    }

    /// Reset every objective of a session to confidence 0 / not started.
    pub fn reset_objectives(&self, session_id: &str) -> bool {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(progress) = sessions.get_mut(session_id) else {
            return false;
        };
        for objective in &mut progress.objectives {
            objective.reset();
        }
        progress.last_updated = Utc::now();
        true
    }

    /// Drop a session. Returns whether it existed.
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    /// All sessions, for persistence by the caller.
    pub fn snapshot(&self) -> Vec<LearningProgress> {
        let mut all: Vec<LearningProgress> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        all
    }

    /// Load sessions produced by [`snapshot`](Self::snapshot), replacing any
    /// in-memory session with the same id. Confidences are clamped to [0, 5].
    pub fn restore(&self, snapshot: Vec<LearningProgress>) {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for mut progress in snapshot {
            for objective in &mut progress.objectives {
                if !objective.confidence.is_finite() {
                    objective.confidence = 0.0;
                }
                objective.confidence = objective.confidence.clamp(0.0, MAX_CONFIDENCE);
            }
            sessions.insert(progress.session_id.clone(), progress);
        }
    }
}

/// Move `current` toward `target` by at most `max_step`, clamped to [0, 5].
fn smooth(current: f64, target: f64, max_step: f64) -> f64 {
    let delta = target - current;
    let step = delta.abs().min(max_step).copysign(delta);
    (current + step).clamp(0.0, MAX_CONFIDENCE)
}
