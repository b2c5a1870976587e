//! Self-Critique Check (§4.5)
//!
//! Evaluates a candidate expression against five weighted principles and
//! produces a calibrated uncertainty estimate. Writes one row per
//! evaluation regardless of outcome (fed into C9's reward trend).

const WEIGHT_HONESTY: f32 = 0.25;
const WEIGHT_MEMORY_REFERENCE: f32 = 0.20;
const WEIGHT_EMPATHY: f32 = 0.25;
const WEIGHT_ACCURACY: f32 = 0.15;
const WEIGHT_TONE: f32 = 0.15;

#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipleScores {
    pub honesty: f32,
    pub memory_reference: f32,
    pub empathy: f32,
    pub accuracy: f32,
    pub tone: f32,
}

impl PrincipleScores {
    pub fn quality_score(&self) -> f32 {
        WEIGHT_HONESTY * self.honesty.clamp(0.0, 1.0)
            + WEIGHT_MEMORY_REFERENCE * self.memory_reference.clamp(0.0, 1.0)
            + WEIGHT_EMPATHY * self.empathy.clamp(0.0, 1.0)
            + WEIGHT_ACCURACY * self.accuracy.clamp(0.0, 1.0)
            + WEIGHT_TONE * self.tone.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CritiqueResult {
    pub principles: PrincipleScores,
    pub quality_score: f32,
    pub uncertainty_level: f32,
    pub verification_passed: bool,
}

/// Inputs a heuristic evaluator uses; a production deployment wires these
/// from an LLM-based judge through the same seam as S2 deliberation, but
/// the scoring/weighting contract here is what C6 depends on regardless of
/// provider.
pub struct CritiqueInputs<'a> {
    pub candidate_message: &'a str,
    pub has_unverified_claim: bool,
    pub references_memory: bool,
    pub style_violations: u32,
}

pub struct SelfCritique {
    base_uncertainty: f32,
    quality_threshold: f32,
}

impl SelfCritique {
    pub fn new(base_uncertainty: f32, quality_threshold: f32) -> Self {
        Self { base_uncertainty, quality_threshold }
    }

    /// Evaluate a candidate; this never fails — a critique lacking
    /// sufficient signal degrades to conservative scores rather than
    /// erroring, since C6 needs a decision either way.
    pub fn evaluate(&self, inputs: &CritiqueInputs) -> CritiqueResult {
        let principles = PrincipleScores {
            honesty: if inputs.has_unverified_claim { 0.4 } else { 0.9 },
            memory_reference: if inputs.references_memory { 0.9 } else { 0.5 },
            empathy: 0.7,
            accuracy: if inputs.has_unverified_claim { 0.5 } else { 0.85 },
            tone: (1.0 - 0.15 * inputs.style_violations as f32).clamp(0.0, 1.0),
        };

        let quality_score = principles.quality_score();

        let mut uncertainty = self.base_uncertainty;
        if inputs.has_unverified_claim {
            uncertainty += 0.2;
        }
        if !inputs.references_memory {
            uncertainty += 0.1;
        }
        uncertainty += 0.05 * inputs.style_violations as f32;
        let uncertainty_level = uncertainty.clamp(0.0, 1.0);

        CritiqueResult {
            principles,
            quality_score,
            uncertainty_level,
            verification_passed: !inputs.has_unverified_claim,
        }
    }

    pub fn passes(&self, result: &CritiqueResult) -> bool {
        result.verification_passed && result.quality_score >= self.quality_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_score_matches_spec_weights() {
        let p = PrincipleScores { honesty: 0.8, memory_reference: 0.6, empathy: 0.9, accuracy: 0.7, tone: 0.5 };
        let expected = 0.25 * 0.8 + 0.20 * 0.6 + 0.25 * 0.9 + 0.15 * 0.7 + 0.15 * 0.5;
        assert!((p.quality_score() - expected).abs() < 1e-6);
    }

    #[test]
    fn unverified_claim_fails_verification() {
        let critique = SelfCritique::new(0.1, 0.7);
        let result = critique.evaluate(&CritiqueInputs {
            candidate_message: "x",
            has_unverified_claim: true,
            references_memory: true,
            style_violations: 0,
        });
        assert!(!result.verification_passed);
        assert!(!critique.passes(&result));
    }

    #[test]
    fn clean_candidate_with_memory_reference_passes() {
        let critique = SelfCritique::new(0.1, 0.5);
        let result = critique.evaluate(&CritiqueInputs {
            candidate_message: "x",
            has_unverified_claim: false,
            references_memory: true,
            style_violations: 0,
        });
        assert!(critique.passes(&result));
    }
}
