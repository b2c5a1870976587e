//! Recurring-date stimuli: birthdays, anniversaries, "one year since X".

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use chrono::{Datelike, NaiveDate};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct AnniversaryEntry {
    pub label: String,
    pub month: u32,
    pub day: u32,
}

pub struct AnniversaryCodelet {
    entries: Mutex<Vec<AnniversaryEntry>>,
}

impl AnniversaryCodelet {
    pub fn new() -> Self {
        Self { entries: Mutex::new(Vec::new()) }
    }

    pub fn set_entries(&self, entries: Vec<AnniversaryEntry>) {
        *self.entries.lock().unwrap() = entries;
    }
}

impl Default for AnniversaryCodelet {
    fn default() -> Self {
        Self::new()
    }
}

impl Codelet for AnniversaryCodelet {
    fn name(&self) -> &'static str {
        "anniversary"
    }

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let today: NaiveDate = ctx.clock.now().date_naive();
        let entries = self.entries.lock().unwrap();

        Ok(entries
            .iter()
            .filter(|e| e.month == today.month() && e.day == today.day())
            .map(|e| {
                Stimulus::new(
                    StimulusType::Anniversary,
                    format!("today is {}", e.label),
                    self.name(),
                    serde_json::json!({ "label": e.label }),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn matches_only_on_the_exact_day() {
        let codelet = AnniversaryCodelet::new();
        codelet.set_entries(vec![AnniversaryEntry { label: "work anniversary".into(), month: 3, day: 15 }]);

        let on_day = TestClock::at(Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap());
        let ctx = CodeletContext { clock: Arc::new(on_day), active_goals: Vec::new() };
        assert_eq!(codelet.sense(&ctx).unwrap().len(), 1);

        let off_day = TestClock::at(Utc.with_ymd_and_hms(2024, 3, 16, 9, 0, 0).unwrap());
        let ctx2 = CodeletContext { clock: Arc::new(off_day), active_goals: Vec::new() };
        assert!(codelet.sense(&ctx2).unwrap().is_empty());
    }
}
