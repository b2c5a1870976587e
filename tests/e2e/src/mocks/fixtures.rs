//! Fixture builders for the domain entities exercised by the journey
//! tests, one factory function per entity rather than a generic "batch of
//! N" generator: the journeys care about specific motivation scores and
//! timestamps, not volume.

use cc_core::domain::{MotivationBreakdown, Stimulus, StimulusType, Thought, ThoughtType};

pub fn stimulus_fixture(stimulus_type: StimulusType, content: &str) -> Stimulus {
    Stimulus::new(stimulus_type, content, "fixture_codelet", serde_json::json!({}))
}

/// A thought whose `weighted_score()` lands on `motivation`, by putting the
/// whole score on `relevance` (weight 0.25) and `impact` (weight 0.25) in
/// equal parts — close enough for threshold/ordering assertions without
/// hand-solving the five-term weighted sum for an arbitrary target.
pub fn thought_with_motivation(content: &str, stimulus_ids: Vec<String>, motivation: f32) -> Thought {
    let half = (motivation / 0.5).clamp(0.0, 1.0);
    let breakdown = MotivationBreakdown {
        relevance: half,
        urgency: 0.0,
        impact: half,
        coherence: 0.0,
        originality: 0.0,
    };
    Thought::new(ThoughtType::System1, content, stimulus_ids, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thought_with_motivation_hits_target_score() {
        let t = thought_with_motivation("hydrate", vec![], 0.85);
        assert!((t.motivation_score - 0.85).abs() < 1e-5);
    }
}
