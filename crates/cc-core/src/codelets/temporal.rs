//! Time-of-day and cadence stimuli: "it's been a while", meal/sleep windows.

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use chrono::Timelike;

pub struct TemporalCodelet;

impl Codelet for TemporalCodelet {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let now = ctx.clock.now();
        let hour = now.hour();

        let content = match hour {
            6..=9 => "good morning check-in window",
            12..=13 => "midday check-in window",
            21..=23 => "evening wind-down window",
            _ => return Ok(vec![]),
        };

        Ok(vec![Stimulus::new(
            StimulusType::Temporal,
            content,
            self.name(),
            serde_json::json!({ "hour": hour }),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn emits_morning_window_stimulus() {
        let clock = TestClock::at(Utc.with_ymd_and_hms(2024, 1, 3, 7, 0, 0).unwrap());
        let ctx = CodeletContext { clock: Arc::new(clock), active_goals: Vec::new() };
        let stimuli = TemporalCodelet.sense(&ctx).unwrap();
        assert_eq!(stimuli.len(), 1);
        assert_eq!(stimuli[0].stimulus_type, StimulusType::Temporal);
    }

    #[test]
    fn quiet_hours_emit_nothing() {
        let clock = TestClock::at(Utc.with_ymd_and_hms(2024, 1, 3, 15, 0, 0).unwrap());
        let ctx = CodeletContext { clock: Arc::new(clock), active_goals: Vec::new() };
        let stimuli = TemporalCodelet.sense(&ctx).unwrap();
        assert!(stimuli.is_empty());
    }
}
