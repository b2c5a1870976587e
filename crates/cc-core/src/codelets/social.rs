//! Social-context stimuli: a long silence from the user, a reply pending.

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

pub struct SocialCodelet {
    last_user_activity: Mutex<Option<DateTime<Utc>>>,
    silence_threshold: chrono::Duration,
}

impl SocialCodelet {
    pub fn new(silence_threshold: chrono::Duration) -> Self {
        Self { last_user_activity: Mutex::new(None), silence_threshold }
    }

    pub fn record_activity(&self, at: DateTime<Utc>) {
        *self.last_user_activity.lock().unwrap() = Some(at);
    }
}

impl Codelet for SocialCodelet {
    fn name(&self) -> &'static str {
        "social"
    }

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let now = ctx.clock.now();
        let last = *self.last_user_activity.lock().unwrap();

        let Some(last) = last else { return Ok(vec![]) };
        if now - last < self.silence_threshold {
            return Ok(vec![]);
        }

        Ok(vec![Stimulus::new(
            StimulusType::Social,
            "extended silence from user",
            self.name(),
            serde_json::json!({ "lastActivity": last.to_rfc3339(), "socialWeight": 0.7 }),
        )])
    }
}
