//! Health & Care Policy (C15, §4.12)
//!
//! Exposes the boolean predicates the Router and Cycle Driver consult
//! before emitting: `in_dnd`, `allowed_now`, `cooldown_remaining_min`, and a
//! `current_wellbeing` snapshot. Each is a pure function of values the
//! caller has already read from the Store and the clock; this module holds
//! no connection of its own.

use crate::domain::{CareLimits, CareState};
use chrono::{DateTime, Utc};

/// Everything the policy needs about one category to answer `allowed_now`
/// and `cooldown_remaining_min`, pulled from the expression log by the
/// caller.
pub struct CategoryActivity {
    pub attempts_today: u32,
    pub last_successful_attempt: Option<DateTime<Utc>>,
}

pub struct CarePolicy<'a> {
    limits: &'a CareLimits,
}

impl<'a> CarePolicy<'a> {
    pub fn new(limits: &'a CareLimits) -> Self {
        Self { limits }
    }

    pub fn in_dnd(&self, category: &str, now: DateTime<Utc>) -> bool {
        self.limits.in_dnd(category, now)
    }

    /// True only when the category hasn't hit its daily cap and isn't
    /// mid-cooldown; DND is checked separately by the router (§4.4 step 3).
    pub fn allowed_now(&self, category: &str, activity: &CategoryActivity, now: DateTime<Utc>) -> bool {
        if activity.attempts_today >= self.limits.daily_limit(category) {
            return false;
        }
        self.cooldown_remaining_min(category, activity, now) == 0
    }

    /// Minutes remaining before this category's cooldown clears, 0 if it
    /// isn't in cooldown at all.
    pub fn cooldown_remaining_min(&self, category: &str, activity: &CategoryActivity, now: DateTime<Utc>) -> i64 {
        let cooldown = self.limits.cooldown_minutes(category);
        if cooldown <= 0 {
            return 0;
        }
        let Some(last) = activity.last_successful_attempt else {
            return 0;
        };
        let elapsed_min = (now - last).num_minutes();
        (cooldown - elapsed_min).max(0)
    }
}

/// A read-only view of the current wellbeing snapshot, or `None` if no
/// CareState has been recorded yet (callers should treat that as "no
/// constraint" rather than erroring, per §4.12's store-backed semantics).
pub fn current_wellbeing(state: Option<&CareState>, now: DateTime<Utc>) -> Option<f32> {
    state.filter(|s| s.is_valid_at(now)).map(|s| s.wellbeing_index())
}
