//! Codelets (C3)
//!
//! Small, independent detectors that each watch one signal source and emit
//! `Stimulus` candidates during the SENSE phase. A `Registry` holds the
//! active set and runs them each tick; a codelet's own failure never stops
//! the others (§4.1's "a single codelet panicking or erroring must not
//! prevent the rest from running").

mod anniversary;
mod calendar;
mod emotional;
mod goal;
mod pattern;
mod social;
mod temporal;

pub use anniversary::AnniversaryCodelet;
pub use calendar::CalendarCodelet;
pub use emotional::EmotionalCodelet;
pub use goal::GoalCodelet;
pub use pattern::PatternCodelet;
pub use social::SocialCodelet;
pub use temporal::TemporalCodelet;

use crate::clock::Clock;
use crate::domain::Stimulus;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CodeletError {
    #[error("codelet {name} failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A perception source. Implementors should be cheap to call every tick;
/// anything expensive (network calls, big scans) belongs behind its own
/// cadence check inside `sense`.
pub trait Codelet: Send + Sync {
    /// Stable identifier stored as `Stimulus::source_codelet`.
    fn name(&self) -> &'static str;

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error>;
}

/// Shared read-only context codelets may consult (current time, recent
/// history). Kept deliberately small; codelets needing storage access hold
/// their own `Arc<Storage>` clone.
pub struct CodeletContext {
    pub clock: Arc<dyn Clock>,
    /// Names of goals currently tracked as active, for codelets or
    /// downstream scoring that weighs a stimulus against them (§4.2's
    /// goal_relevance dimension).
    pub active_goals: Vec<String>,
}

/// Lets an `Arc<T>` stand in for `Box<dyn Codelet>` in the `Registry`, so a
/// codelet the driver also needs a typed handle to (to query its state
/// directly) can be registered without a second owned copy.
impl<T: Codelet + ?Sized> Codelet for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        (**self).sense(ctx)
    }
}

/// The set of codelets run each SENSE phase.
pub struct Registry {
    codelets: Vec<Box<dyn Codelet>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { codelets: Vec::new() }
    }

    pub fn register(&mut self, codelet: Box<dyn Codelet>) {
        self.codelets.push(codelet);
    }

    /// Run every registered codelet, logging and skipping any that error
    /// rather than aborting the whole SENSE phase.
    pub fn run_all(&self, ctx: &CodeletContext) -> Vec<Stimulus> {
        let mut out = Vec::new();
        for codelet in &self.codelets {
            match codelet.sense(ctx) {
                Ok(mut stimuli) => out.append(&mut stimuli),
                Err(err) => {
                    tracing::warn!(codelet = codelet.name(), error = %err, "codelet failed, skipping");
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.codelets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codelets.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    struct FailingCodelet;
    impl Codelet for FailingCodelet {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn sense(&self, _ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    struct OkCodelet;
    impl Codelet for OkCodelet {
        fn name(&self) -> &'static str {
            "ok"
        }
        fn sense(&self, _ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
            Ok(vec![Stimulus::new(
                crate::domain::StimulusType::Other,
                "hello",
                "ok",
                serde_json::json!({}),
            )])
        }
    }

    #[test]
    fn one_failing_codelet_does_not_stop_the_others() {
        let mut registry = Registry::new();
        registry.register(Box::new(FailingCodelet));
        registry.register(Box::new(OkCodelet));

        let ctx = CodeletContext { clock: Arc::new(SystemClock), active_goals: Vec::new() };
        let stimuli = registry.run_all(&ctx);
        assert_eq!(stimuli.len(), 1);
    }

    #[test]
    fn arc_wrapped_codelet_satisfies_the_trait() {
        let codelet: Arc<OkCodelet> = Arc::new(OkCodelet);
        let mut registry = Registry::new();
        registry.register(Box::new(Arc::clone(&codelet)));

        let ctx = CodeletContext { clock: Arc::new(SystemClock), active_goals: Vec::new() };
        assert_eq!(registry.run_all(&ctx).len(), 1);
    }
}
