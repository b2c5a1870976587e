//! Upcoming calendar-event stimuli, fed by an external calendar adapter.

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct UpcomingEvent {
    pub title: String,
    pub starts_at: DateTime<Utc>,
}

pub struct CalendarCodelet {
    upcoming: Mutex<Vec<UpcomingEvent>>,
    lookahead: chrono::Duration,
}

impl CalendarCodelet {
    pub fn new(lookahead: chrono::Duration) -> Self {
        Self { upcoming: Mutex::new(Vec::new()), lookahead }
    }

    pub fn set_upcoming(&self, events: Vec<UpcomingEvent>) {
        *self.upcoming.lock().unwrap() = events;
    }
}

impl Codelet for CalendarCodelet {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let now = ctx.clock.now();
        let horizon = now + self.lookahead;
        let events = self.upcoming.lock().unwrap();

        Ok(events
            .iter()
            .filter(|e| e.starts_at > now && e.starts_at <= horizon)
            .map(|e| {
                Stimulus::new(
                    StimulusType::Calendar,
                    format!("upcoming event: {}", e.title),
                    self.name(),
                    serde_json::json!({ "title": e.title, "startsAt": e.starts_at.to_rfc3339(), "deadline": e.starts_at.to_rfc3339() }),
                )
            })
            .collect())
    }
}
