//! The external deliberation contract System 2 invokes (§4.3, §6): context
//! bundle + stimulus in, zero or more thought candidates out. The actual
//! model call is out of scope here — this module only specifies and
//! exercises the interface, with a no-op implementation for tests and for
//! running without a configured provider.

use crate::domain::{CareState, MotivationBreakdown, Stimulus, Thought};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBundle {
    pub recent_stimuli: Vec<Stimulus>,
    pub related_memories: Vec<String>,
    pub care_state: Option<CareState>,
    pub recent_thoughts: Vec<Thought>,
    pub token_budget: usize,
}

#[derive(Debug, Clone)]
pub struct DeliberationRequest {
    pub context: ContextBundle,
    pub stimulus: Stimulus,
}

#[derive(Debug, Clone)]
pub struct ThoughtCandidate {
    pub content: String,
    pub breakdown: MotivationBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct DeliberationResponse {
    pub candidates: Vec<ThoughtCandidate>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliberationError {
    #[error("deliberation contract unavailable: {0}")]
    Unavailable(String),
    #[error("deliberation call timed out")]
    Timeout,
}

/// The seam System 2 calls through. Production wiring plugs in whatever
/// transport reaches the configured provider; tests and offline runs use
/// `NoopDeliberation`.
pub trait Deliberate: Send + Sync {
    fn deliberate(&self, request: DeliberationRequest) -> Result<DeliberationResponse, DeliberationError>;

    /// Whether a real provider backs this contract, as opposed to an
    /// offline/no-op stand-in. Callers that must not invent output when
    /// deliberation is unavailable (the Consolidator's abstraction step,
    /// §4.6) gate on this.
    fn is_configured(&self) -> bool;
}

/// Always succeeds with either zero or a fixed one candidate, never reaches
/// out over the network. Used when no deliberation provider is configured
/// and in unit tests that only exercise the S1/S2 budget plumbing.
pub struct NoopDeliberation {
    fixed_candidate: Option<ThoughtCandidate>,
}

impl NoopDeliberation {
    pub fn unavailable() -> Self {
        Self { fixed_candidate: None }
    }

    pub fn always_one_candidate() -> Self {
        Self {
            fixed_candidate: Some(ThoughtCandidate {
                content: "a deliberated thought".to_string(),
                breakdown: MotivationBreakdown { relevance: 0.7, urgency: 0.5, impact: 0.6, coherence: 0.6, originality: 0.6 },
            }),
        }
    }
}

impl Deliberate for NoopDeliberation {
    fn deliberate(&self, _request: DeliberationRequest) -> Result<DeliberationResponse, DeliberationError> {
        Ok(DeliberationResponse {
            candidates: self.fixed_candidate.iter().cloned().collect(),
        })
    }

    fn is_configured(&self) -> bool {
        self.fixed_candidate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StimulusType;

    #[test]
    fn unavailable_deliberation_yields_zero_candidates_not_an_error() {
        let d = NoopDeliberation::unavailable();
        let request = DeliberationRequest {
            context: ContextBundle::default(),
            stimulus: Stimulus::new(StimulusType::Other, "x", "y", serde_json::json!({})),
        };
        let response = d.deliberate(request).unwrap();
        assert!(response.candidates.is_empty());
    }
}
