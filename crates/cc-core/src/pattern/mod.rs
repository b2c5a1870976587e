//! Pattern & Prediction Engine (C11, §4.7)
//!
//! Mines five pattern families from the recent episodic window and runs a
//! verification sweep over due Predictions.

mod families;
mod verification;

pub use families::{DetectedPattern, PatternFamily};
pub use verification::{verify_prediction, VerificationOutcome};

use crate::domain::{Prediction, Stimulus};

/// Run every pattern family over the recent window and return the
/// patterns whose confidence clears `threshold`.
pub fn mine_patterns(recent: &[Stimulus], threshold: f32) -> Vec<DetectedPattern> {
    let mut out = Vec::new();
    for family in PatternFamily::all() {
        out.extend(family.mine(recent).into_iter().filter(|p| p.confidence >= threshold));
    }
    out
}

/// Turn a detected pattern into a Prediction if the family supports
/// forecasting (not every family does; topic-sequence patterns, for
/// instance, describe structure rather than timing).
pub fn predict_from_pattern(pattern: &DetectedPattern, now: chrono::DateTime<chrono::Utc>) -> Option<Prediction> {
    pattern.family.predicted_offset().map(|offset| {
        Prediction::new(
            pattern.family.as_str(),
            pattern.description.clone(),
            pattern.confidence,
            now + offset,
            pattern.structural_key.clone(),
        )
    })
}
