//! Thought Engine (C5)
//!
//! Turns top-K scored Stimuli into zero or more Thoughts. System 1 is
//! template-driven and never fails; System 2 is a bounded call into an
//! external deliberation contract (§4.3, §6).

mod deliberation;
mod templates;

pub use deliberation::{
    ContextBundle, Deliberate, DeliberationError, DeliberationRequest, DeliberationResponse,
    NoopDeliberation, ThoughtCandidate,
};
pub use templates::{TemplateMatch, TemplateRegistry};

use crate::domain::{MotivationBreakdown, Thought, ThoughtType};
use std::time::{Duration, Instant};

pub struct ThoughtEngineConfig {
    pub s2_max_calls_per_tick: u32,
    pub s2_latency: Duration,
}

/// Drives one ACT phase's worth of thought generation for the selected
/// stimuli, enforcing the S2 per-tick budget (§4.3).
pub struct ThoughtEngine {
    templates: TemplateRegistry,
    deliberation: Box<dyn Deliberate>,
    config: ThoughtEngineConfig,
}

impl ThoughtEngine {
    pub fn new(templates: TemplateRegistry, deliberation: Box<dyn Deliberate>, config: ThoughtEngineConfig) -> Self {
        Self { templates, deliberation, config }
    }

    /// Whether System 2 is backed by a real deliberation provider, as
    /// opposed to the offline no-op fallback.
    pub fn deliberation_configured(&self) -> bool {
        self.deliberation.is_configured()
    }

    /// Generate Thoughts for one stimulus, running S1 always and S2 only
    /// while the per-tick budget (call count and elapsed latency) allows.
    pub fn generate(
        &self,
        stimulus: &crate::domain::Stimulus,
        bundle: &ContextBundle,
        s2_calls_so_far: &mut u32,
        tick_started_at: Instant,
    ) -> Vec<Thought> {
        let mut thoughts: Vec<Thought> = self
            .templates
            .match_all(stimulus)
            .into_iter()
            .map(|m| {
                Thought::new(ThoughtType::System1, m.content, vec![stimulus.id.clone()], m.breakdown)
            })
            .collect();

        let budget_remaining = *s2_calls_so_far < self.config.s2_max_calls_per_tick
            && tick_started_at.elapsed() < self.config.s2_latency;

        if budget_remaining {
            *s2_calls_so_far += 1;
            let request = DeliberationRequest {
                context: bundle.clone(),
                stimulus: stimulus.clone(),
            };
            match self.deliberation.deliberate(request) {
                Ok(response) => {
                    for candidate in response.candidates {
                        thoughts.push(Thought::new(
                            ThoughtType::System2,
                            candidate.content,
                            vec![stimulus.id.clone()],
                            candidate.breakdown,
                        ));
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "S2 deliberation unavailable, continuing with S1 only");
                }
            }
        }

        thoughts
    }

    /// An evolved thought replaces its parent when it shares the same
    /// stimulus id set and strictly improves motivation (§4.3).
    pub fn evolves(parent: &Thought, child: &Thought) -> bool {
        parent.status == crate::domain::ThoughtStatus::Active
            && parent.stimulus_ids == child.stimulus_ids
            && child.motivation_score > parent.motivation_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Stimulus, StimulusType};

    #[test]
    fn s2_budget_exhaustion_falls_back_to_s1_only() {
        let templates = TemplateRegistry::with_defaults();
        let deliberation = Box::new(NoopDeliberation::always_one_candidate());
        let config = ThoughtEngineConfig { s2_max_calls_per_tick: 0, s2_latency: Duration::from_secs(8) };
        let engine = ThoughtEngine::new(templates, deliberation, config);

        let stimulus = Stimulus::new(StimulusType::Temporal, "good morning check-in window", "temporal", serde_json::json!({}));
        let bundle = ContextBundle::default();
        let mut calls = 0;
        let thoughts = engine.generate(&stimulus, &bundle, &mut calls, Instant::now());

        assert!(thoughts.iter().all(|t| t.thought_type == ThoughtType::System1));
    }

    #[test]
    fn evolved_thought_requires_same_stimulus_set_and_higher_score() {
        let mut parent = Thought::new(ThoughtType::System1, "a", vec!["s1".into()], MotivationBreakdown::default());
        parent.motivation_score = 0.3;
        let mut child = Thought::new(ThoughtType::System2, "b", vec!["s1".into()], MotivationBreakdown::default());
        child.motivation_score = 0.5;
        assert!(ThoughtEngine::evolves(&parent, &child));

        child.stimulus_ids = vec!["s2".into()];
        assert!(!ThoughtEngine::evolves(&parent, &child));
    }
}
