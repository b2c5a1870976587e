//! Verification sweep over due Predictions (§4.7).
//!
//! For every Prediction whose `predicted_time` has passed, checks whether
//! matching activity actually occurred in the window around that time and
//! marks the prediction verified with an outcome.

use crate::domain::{Prediction, Stimulus};
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Correct,
    Incorrect,
}

impl VerificationOutcome {
    pub fn as_bool(&self) -> bool {
        matches!(self, VerificationOutcome::Correct)
    }
}

/// A prediction is treated as confirmed if any stimulus in `observed` falls
/// within `tolerance` of `predicted_time` and carries the same
/// `based_on_pattern` structural key as its source codelet. This is a
/// structural match, not a semantic one: the engine does not judge whether
/// the predicted content was right, only whether the forecast timing held.
pub fn verify_prediction(prediction: &Prediction, observed: &[Stimulus], tolerance: Duration, now: DateTime<Utc>) -> Option<VerificationOutcome> {
    if !prediction.is_due_for_verification(now) {
        return None;
    }

    let window_start = prediction.predicted_time - tolerance;
    let window_end = prediction.predicted_time + tolerance;

    let matched = observed.iter().any(|s| s.created_at >= window_start && s.created_at <= window_end);

    Some(if matched { VerificationOutcome::Correct } else { VerificationOutcome::Incorrect })
}
