//! Reward Aggregator (C8, §4.8)
//!
//! Scores one ExpressionAttempt's outcome from three independent signals and
//! combines them via `domain::reward::combined_reward`'s proportional
//! redistribution rule.

use crate::domain::{RewardSignal, RewardWeights};

/// A named explicit-feedback source and its fixed sign/magnitude, per the
/// "table" referenced in §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitSource {
    Praise,
    Correction,
    ThumbsUp,
    ThumbsDown,
    FollowUp,
    Silence,
}

impl ExplicitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplicitSource::Praise => "praise",
            ExplicitSource::Correction => "correction",
            ExplicitSource::ThumbsUp => "thumbs_up",
            ExplicitSource::ThumbsDown => "thumbs_down",
            ExplicitSource::FollowUp => "follow_up",
            ExplicitSource::Silence => "silence",
        }
    }

    /// Fixed sign and magnitude for this source; `Silence` carries no signal
    /// at all (the caller should treat `None` as no explicit component).
    pub fn score(&self) -> Option<f32> {
        match self {
            ExplicitSource::Praise => Some(0.8),
            ExplicitSource::ThumbsUp => Some(0.6),
            ExplicitSource::FollowUp => Some(0.3),
            ExplicitSource::Correction => Some(-0.6),
            ExplicitSource::ThumbsDown => Some(-0.8),
            ExplicitSource::Silence => None,
        }
    }
}

/// Classification of the user's post-expression behavior, driving the
/// implicit score (§4.8: "engagement continuation positive, abandonment or
/// topic-switch negative").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpBehavior {
    EngagementContinued,
    TopicSwitched,
    Abandoned,
    Neutral,
}

impl FollowUpBehavior {
    pub fn as_classification_str(&self) -> &'static str {
        match self {
            FollowUpBehavior::EngagementContinued => "engaged",
            FollowUpBehavior::TopicSwitched => "topic_switch",
            FollowUpBehavior::Abandoned => "abandoned",
            FollowUpBehavior::Neutral => "neutral",
        }
    }

    fn implicit_score(&self) -> Option<f32> {
        match self {
            FollowUpBehavior::EngagementContinued => Some(0.5),
            FollowUpBehavior::TopicSwitched => Some(-0.3),
            FollowUpBehavior::Abandoned => Some(-0.5),
            FollowUpBehavior::Neutral => None,
        }
    }
}

/// Everything the aggregator needs to score one ExpressionAttempt.
pub struct ScoringInputs {
    pub explicit_source: Option<ExplicitSource>,
    pub follow_up: Option<FollowUpBehavior>,
    pub self_eval_score: Option<f32>,
    pub conversation_id: Option<String>,
}

/// Build a RewardSignal for one ExpressionAttempt, applying §3's
/// clamp-then-weight-with-proportional-redistribution rule via
/// `RewardSignal::aggregate`.
pub fn score_attempt(expression_attempt_id: impl Into<String>, inputs: &ScoringInputs, weights: RewardWeights) -> RewardSignal {
    let explicit_score = inputs.explicit_source.and_then(|s| s.score());
    let implicit_score = inputs.follow_up.and_then(|f| f.implicit_score());

    RewardSignal::aggregate(
        expression_attempt_id,
        explicit_score,
        implicit_score,
        inputs.self_eval_score,
        inputs.explicit_source.map(|s| s.as_str().to_string()),
        inputs.follow_up.map(|f| f.as_classification_str().to_string()),
        inputs.conversation_id.clone(),
        weights,
    )
}
