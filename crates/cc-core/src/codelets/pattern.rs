//! Surfaces stimuli from patterns the Pattern & Prediction Engine (C11) has
//! already detected and deemed worth re-raising to attention.

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct DetectedPatternHit {
    pub structural_key: String,
    pub description: String,
    pub confidence: f32,
}

pub struct PatternCodelet {
    hits: Mutex<Vec<DetectedPatternHit>>,
    confidence_floor: f32,
}

impl PatternCodelet {
    pub fn new(confidence_floor: f32) -> Self {
        Self { hits: Mutex::new(Vec::new()), confidence_floor }
    }

    pub fn push_hit(&self, hit: DetectedPatternHit) {
        self.hits.lock().unwrap().push(hit);
    }
}

impl Codelet for PatternCodelet {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn sense(&self, _ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let mut hits = self.hits.lock().unwrap();
        let drained: Vec<DetectedPatternHit> = hits.drain(..).collect();

        Ok(drained
            .into_iter()
            .filter(|h| h.confidence >= self.confidence_floor)
            .map(|h| {
                Stimulus::new(
                    StimulusType::Pattern,
                    h.description.clone(),
                    self.name(),
                    serde_json::json!({ "structuralKey": h.structural_key, "confidence": h.confidence }),
                )
            })
            .collect())
    }
}
