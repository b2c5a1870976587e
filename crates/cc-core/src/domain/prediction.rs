//! Prediction (C11)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-bound forecast derived from a detected pattern, later verified for
/// accuracy by the Pattern & Prediction Engine's verification sweep (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: String,
    pub prediction_type: String,
    pub prediction_text: String,
    pub confidence: f32,
    pub predicted_time: DateTime<Utc>,
    pub based_on_pattern: String,
    pub verified: bool,
    pub outcome_correct: Option<bool>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(
        prediction_type: impl Into<String>,
        prediction_text: impl Into<String>,
        confidence: f32,
        predicted_time: DateTime<Utc>,
        based_on_pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prediction_type: prediction_type.into(),
            prediction_text: prediction_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            predicted_time,
            based_on_pattern: based_on_pattern.into(),
            verified: false,
            outcome_correct: None,
            verified_at: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this prediction is due for the verification sweep: its
    /// predicted time has passed and it has not yet been verified.
    pub fn is_due_for_verification(&self, now: DateTime<Utc>) -> bool {
        !self.verified && self.predicted_time <= now
    }

    pub fn mark_verified(&mut self, outcome_correct: bool, at: DateTime<Utc>) {
        self.verified = true;
        self.outcome_correct = Some(outcome_correct);
        self.verified_at = Some(at);
    }
}
