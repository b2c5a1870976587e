//! Motivation & Expression Router (§4.4): the 5-step decision procedure
//! from quality gate through channel pick.

use super::critique::{CritiqueInputs, CritiqueResult, SelfCritique};
use crate::domain::{CareLimits, SuppressReason, Thought};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub enum RouterDecision {
    EmitToChannel { channel: String },
    EnqueueForUi,
    Suppress { reason: SuppressReason },
}

/// Category -> overriding flag. Categories in this set bypass the
/// user-state filter (§4.4 step 4).
pub struct UserStateFilter {
    pub blocked_states: HashSet<String>,
    pub overriding_categories: HashSet<String>,
}

/// `(category, user_state) -> channel`. An empty lookup falls back to
/// `enqueue_for_ui` (§4.4 step 5).
pub struct ChannelPolicy {
    table: HashMap<(String, String), String>,
}

impl ChannelPolicy {
    pub fn new() -> Self {
        Self { table: HashMap::new() }
    }

    pub fn set(&mut self, category: impl Into<String>, user_state: impl Into<String>, channel: impl Into<String>) {
        self.table.insert((category.into(), user_state.into()), channel.into());
    }

    pub fn pick(&self, category: &str, user_state: &str) -> Option<&str> {
        self.table.get(&(category.to_string(), user_state.to_string())).map(|s| s.as_str())
    }
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-thought facts the router needs that live outside the Thought row
/// itself: its category, the critique outcome, and whatever prior
/// ExpressionAttempts/care state bear on the gates.
pub struct RoutingContext<'a> {
    pub category: &'a str,
    pub critique_inputs: CritiqueInputs<'a>,
    pub last_successful_attempt_for_content: Option<DateTime<Utc>>,
    pub detected_user_state: Option<&'a str>,
    pub emitted_categories_this_tick: &'a HashSet<String>,
}

pub struct ExpressionRouter {
    critique: SelfCritique,
    dedup_window: chrono::Duration,
    care_limits: CareLimits,
    user_state_filter: UserStateFilter,
    channel_policy: ChannelPolicy,
}

impl ExpressionRouter {
    pub fn new(
        critique: SelfCritique,
        dedup_window: chrono::Duration,
        care_limits: CareLimits,
        user_state_filter: UserStateFilter,
        channel_policy: ChannelPolicy,
    ) -> Self {
        Self { critique, dedup_window, care_limits, user_state_filter, channel_policy }
    }

    /// Decide what to do with `thought`, given the resolved context. Also
    /// returns the CritiqueResult so the caller can persist the critique
    /// log row regardless of the final decision (§4.5: "writes one row per
    /// evaluation regardless of outcome").
    pub fn decide(&self, thought: &Thought, ctx: &RoutingContext, now: DateTime<Utc>) -> (RouterDecision, CritiqueResult) {
        let critique_result = self.critique.evaluate(&ctx.critique_inputs);

        if !self.critique.passes(&critique_result) {
            return (RouterDecision::Suppress { reason: SuppressReason::Quality }, critique_result);
        }

        if let Some(last) = ctx.last_successful_attempt_for_content {
            if now - last < self.dedup_window {
                return (RouterDecision::Suppress { reason: SuppressReason::Duplicate }, critique_result);
            }
        }

        if self.care_limits.in_dnd(ctx.category, now) {
            return (RouterDecision::Suppress { reason: SuppressReason::Dnd }, critique_result);
        }

        // Daily-cap / cooldown are resolved by the caller against Store
        // counts and folded into ctx before calling decide(); here we only
        // check the single-emission-per-category-per-tick invariant.
        if ctx.emitted_categories_this_tick.contains(ctx.category) {
            return (RouterDecision::Suppress { reason: SuppressReason::RateLimit }, critique_result);
        }

        if let Some(state) = ctx.detected_user_state {
            let blocked = self.user_state_filter.blocked_states.contains(state);
            let overriding = self.user_state_filter.overriding_categories.contains(ctx.category);
            if blocked && !overriding {
                return (RouterDecision::Suppress { reason: SuppressReason::StateFilter }, critique_result);
            }
        }

        let state_key = ctx.detected_user_state.unwrap_or("none");
        match self.channel_policy.pick(ctx.category, state_key) {
            Some(channel) => (RouterDecision::EmitToChannel { channel: channel.to_string() }, critique_result),
            None => (RouterDecision::EnqueueForUi, critique_result),
        }
    }

    /// Order thoughts by descending motivation_score (§4.4: "the router
    /// processes thoughts in descending motivation_score").
    pub fn order_by_motivation_desc(thoughts: &mut [Thought]) {
        thoughts.sort_by(|a, b| b.motivation_score.partial_cmp(&a.motivation_score).unwrap_or(std::cmp::Ordering::Equal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MotivationBreakdown, ThoughtType};

    fn thought() -> Thought {
        Thought::new(ThoughtType::System1, "hello", vec!["s1".into()], MotivationBreakdown::default())
    }

    fn clean_inputs<'a>() -> CritiqueInputs<'a> {
        CritiqueInputs { candidate_message: "hello", has_unverified_claim: false, references_memory: true, style_violations: 0 }
    }

    #[test]
    fn duplicate_within_window_suppresses() {
        let router = ExpressionRouter::new(
            SelfCritique::new(0.1, 0.5),
            chrono::Duration::minutes(60),
            CareLimits::default(),
            UserStateFilter { blocked_states: Default::default(), overriding_categories: Default::default() },
            ChannelPolicy::default(),
        );
        let now = Utc::now();
        let ctx = RoutingContext {
            category: "other",
            critique_inputs: clean_inputs(),
            last_successful_attempt_for_content: Some(now - chrono::Duration::minutes(10)),
            detected_user_state: None,
            emitted_categories_this_tick: &Default::default(),
        };

        let (decision, _) = router.decide(&thought(), &ctx, now);
        assert!(matches!(decision, RouterDecision::Suppress { reason: SuppressReason::Duplicate }));
    }

    #[test]
    fn empty_channel_pick_falls_back_to_enqueue_for_ui() {
        let router = ExpressionRouter::new(
            SelfCritique::new(0.1, 0.5),
            chrono::Duration::minutes(60),
            CareLimits::default(),
            UserStateFilter { blocked_states: Default::default(), overriding_categories: Default::default() },
            ChannelPolicy::default(),
        );
        let now = Utc::now();
        let ctx = RoutingContext {
            category: "other",
            critique_inputs: clean_inputs(),
            last_successful_attempt_for_content: None,
            detected_user_state: None,
            emitted_categories_this_tick: &Default::default(),
        };

        let (decision, _) = router.decide(&thought(), &ctx, now);
        assert!(matches!(decision, RouterDecision::EnqueueForUi));
    }

    #[test]
    fn second_emission_in_same_category_this_tick_is_rate_limited() {
        let router = ExpressionRouter::new(
            SelfCritique::new(0.1, 0.5),
            chrono::Duration::minutes(60),
            CareLimits::default(),
            UserStateFilter { blocked_states: Default::default(), overriding_categories: Default::default() },
            ChannelPolicy::default(),
        );
        let mut emitted = HashSet::new();
        emitted.insert("other".to_string());
        let now = Utc::now();
        let ctx = RoutingContext {
            category: "other",
            critique_inputs: clean_inputs(),
            last_successful_attempt_for_content: None,
            detected_user_state: None,
            emitted_categories_this_tick: &emitted,
        };

        let (decision, _) = router.decide(&thought(), &ctx, now);
        assert!(matches!(decision, RouterDecision::Suppress { reason: SuppressReason::RateLimit }));
    }

    #[test]
    fn ordering_sorts_motivation_descending() {
        let mut a = thought();
        a.motivation_score = 0.3;
        let mut b = thought();
        b.motivation_score = 0.9;
        let mut thoughts = vec![a, b];
        ExpressionRouter::order_by_motivation_desc(&mut thoughts);
        assert!(thoughts[0].motivation_score >= thoughts[1].motivation_score);
    }
}
