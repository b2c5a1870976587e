//! RewardSignal and the combined-reward formula (C8, §3 invariant)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Weights for the three reward components, defaulting to
/// `{explicit: 0.4, implicit: 0.3, self_eval: 0.3}` per `reward.weights`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardWeights {
    pub explicit: f32,
    pub implicit: f32,
    pub self_eval: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            explicit: 0.4,
            implicit: 0.3,
            self_eval: 0.3,
        }
    }
}

/// A combined scalar summarizing how well a past expression performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSignal {
    pub id: String,
    pub expression_attempt_id: String,
    pub explicit_score: Option<f32>,
    pub implicit_score: Option<f32>,
    pub self_eval_score: Option<f32>,
    pub combined_reward: f32,
    pub explicit_source: Option<String>,
    pub implicit_classification: Option<String>,
    pub principles_evaluated: Vec<String>,
    pub conversation_id: Option<String>,
    pub scored_at: DateTime<Utc>,
}

impl RewardSignal {
    /// Build a RewardSignal from whichever components are present, applying
    /// §3's clamp-then-weight-with-proportional-redistribution rule.
    pub fn aggregate(
        expression_attempt_id: impl Into<String>,
        explicit_score: Option<f32>,
        implicit_score: Option<f32>,
        self_eval_score: Option<f32>,
        explicit_source: Option<String>,
        implicit_classification: Option<String>,
        conversation_id: Option<String>,
        weights: RewardWeights,
    ) -> Self {
        let combined = combined_reward(explicit_score, implicit_score, self_eval_score, weights);

        Self {
            id: Uuid::new_v4().to_string(),
            expression_attempt_id: expression_attempt_id.into(),
            explicit_score: explicit_score.map(|s| s.clamp(-1.0, 1.0)),
            implicit_score: implicit_score.map(|s| s.clamp(-1.0, 1.0)),
            self_eval_score: self_eval_score.map(|s| s.clamp(0.0, 1.0)),
            combined_reward: combined,
            explicit_source,
            implicit_classification,
            principles_evaluated: Vec::new(),
            conversation_id,
            scored_at: Utc::now(),
        }
    }
}

/// `combined_reward = 0.4*explicit + 0.3*implicit + 0.3*self_eval`, each
/// clamped to its stated range before weighting. Missing components have
/// their weight redistributed proportionally among the present ones.
pub fn combined_reward(
    explicit_score: Option<f32>,
    implicit_score: Option<f32>,
    self_eval_score: Option<f32>,
    weights: RewardWeights,
) -> f32 {
    let components: Vec<(f32, f32)> = [
        explicit_score.map(|s| (s.clamp(-1.0, 1.0), weights.explicit)),
        implicit_score.map(|s| (s.clamp(-1.0, 1.0), weights.implicit)),
        self_eval_score.map(|s| (s.clamp(0.0, 1.0), weights.self_eval)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let present_weight: f32 = components.iter().map(|(_, w)| *w).sum();
    if present_weight <= 0.0 {
        return 0.0;
    }

    components
        .iter()
        .map(|(value, weight)| value * (weight / present_weight))
        .sum()
}
