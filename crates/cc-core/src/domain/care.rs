//! CareState / CareLimits / CarePreference (C15)

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A do-not-disturb interval, expressed as a start/end wall-clock time that
/// may cross midnight (e.g. 23:00-06:00).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DndWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl DndWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// True if `at` falls within this window, handling wraparound when
    /// `end <= start` (the window crosses midnight).
    pub fn contains(&self, at: NaiveTime) -> bool {
        if self.start <= self.end {
            at >= self.start && at < self.end
        } else {
            at >= self.start || at < self.end
        }
    }
}

/// Current wellbeing indicators, valid over an interval (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareState {
    pub energy: f32,
    pub stress: f32,
    pub sleep: f32,
    pub fatigue: f32,
    pub detection_context: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl CareState {
    /// `0.3*energy + 0.3*(1-stress) + 0.25*sleep + 0.15*(1-fatigue)`, a
    /// composite wellbeing index in [0,1].
    pub fn wellbeing_index(&self) -> f32 {
        (0.30 * self.energy.clamp(0.0, 1.0)
            + 0.30 * (1.0 - self.stress.clamp(0.0, 1.0))
            + 0.25 * self.sleep.clamp(0.0, 1.0)
            + 0.15 * (1.0 - self.fatigue.clamp(0.0, 1.0)))
        .clamp(0.0, 1.0)
    }

    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.valid_from && at <= self.valid_until
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Operator-configured policy knobs gating emissions (§4.12, §6
/// `care.dnd_weekday`/`care.dnd_weekend`/`care.daily_limits`/`care.cooldown_minutes`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareLimits {
    pub dnd_weekday: Vec<DndWindow>,
    pub dnd_weekend: Vec<DndWindow>,
    pub daily_limits: HashMap<String, u32>,
    pub cooldown_minutes: HashMap<String, i64>,
}

impl CareLimits {
    pub fn in_dnd(&self, category: &str, now: DateTime<Utc>) -> bool {
        let _ = category; // DND windows are global across categories per §4.12
        let windows = if is_weekend(now.weekday()) {
            &self.dnd_weekend
        } else {
            &self.dnd_weekday
        };
        windows.iter().any(|w| w.contains(now.time()))
    }

    pub fn daily_limit(&self, category: &str) -> u32 {
        self.daily_limits.get(category).copied().unwrap_or(u32::MAX)
    }

    pub fn cooldown_minutes(&self, category: &str) -> i64 {
        self.cooldown_minutes.get(category).copied().unwrap_or(0)
    }
}

/// Per-user customization of the care policy (day-type overrides, detection
/// thresholds). Distinct from `CareLimits`, which holds the resolved numeric
/// caps the policy enforces at decision time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePreference {
    pub sleeping_threshold: f32,
    pub deep_focus_threshold: f32,
    pub overriding_categories: Vec<String>,
}
