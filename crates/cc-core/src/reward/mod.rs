//! Reward Aggregator & Evolution (C8, C9, §4.8)

mod aggregator;
mod evolution;

pub use aggregator::{score_attempt, ExplicitSource, FollowUpBehavior, ScoringInputs};
pub use evolution::{adjust_knob, direction_from_trend, trend_mean, KnobAdjustment, KnobBounds};
