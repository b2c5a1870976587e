//! Emotional-state stimuli derived from externally-classified affect signals
//! (e.g. a sentiment classifier run over recent messages by an adapter).

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use std::sync::Mutex;

/// A pending affect observation waiting to be turned into a Stimulus. Queued
/// externally (an adapter pushes observations in); the codelet just drains
/// the queue each tick.
#[derive(Debug, Clone)]
pub struct AffectObservation {
    pub label: String,
    pub intensity: f32,
}

pub struct EmotionalCodelet {
    queue: Mutex<Vec<AffectObservation>>,
}

impl EmotionalCodelet {
    pub fn new() -> Self {
        Self { queue: Mutex::new(Vec::new()) }
    }

    pub fn push(&self, observation: AffectObservation) {
        self.queue.lock().unwrap().push(observation);
    }
}

impl Default for EmotionalCodelet {
    fn default() -> Self {
        Self::new()
    }
}

impl Codelet for EmotionalCodelet {
    fn name(&self) -> &'static str {
        "emotional"
    }

    fn sense(&self, _ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let mut queue = self.queue.lock().unwrap();
        let drained: Vec<AffectObservation> = queue.drain(..).collect();

        Ok(drained
            .into_iter()
            .map(|obs| {
                Stimulus::new(
                    StimulusType::Emotional,
                    format!("detected affect: {}", obs.label),
                    self.name(),
                    serde_json::json!({ "label": obs.label, "intensity": obs.intensity }),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use std::sync::Arc;

    #[test]
    fn drains_queued_observations_exactly_once() {
        let codelet = EmotionalCodelet::new();
        codelet.push(AffectObservation { label: "frustrated".into(), intensity: 0.7 });
        let ctx = CodeletContext { clock: Arc::new(SystemClock), active_goals: Vec::new() };

        let first = codelet.sense(&ctx).unwrap();
        assert_eq!(first.len(), 1);

        let second = codelet.sense(&ctx).unwrap();
        assert!(second.is_empty());
    }
}
