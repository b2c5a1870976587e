//! Test Database Manager
//!
//! Wraps an isolated, in-memory Store per test so journeys don't interfere
//! with each other and leave nothing on disk behind.

use cc_core::domain::{Plan, PlanStep, Stimulus};
use cc_core::Storage;

pub struct TestDatabaseManager {
    pub storage: Storage,
}

impl TestDatabaseManager {
    pub fn new() -> Self {
        Self {
            storage: Storage::in_memory().expect("failed to open in-memory store"),
        }
    }

    /// Persist a stimulus and return the row the Store assigned (content
    /// hash, id, etc. are generated on the way in).
    pub fn seed_stimulus(&self, stimulus: Stimulus) -> Stimulus {
        let mut persisted = self
            .storage
            .persist_sense(vec![stimulus])
            .expect("persist_sense failed");
        persisted.remove(0)
    }

    /// Insert a plan with its steps in one go, as the Planner would on
    /// first creating it.
    pub fn seed_plan(&self, plan: &Plan, steps: &[PlanStep]) {
        self.storage.insert_plan(plan, steps).expect("insert_plan failed");
    }
}

impl Default for TestDatabaseManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::stimulus_fixture;
    use cc_core::domain::StimulusType;

    #[test]
    fn fresh_database_is_empty() {
        let db = TestDatabaseManager::new();
        assert!(db.storage.recent_stimuli(50).unwrap().is_empty());
    }

    #[test]
    fn seed_stimulus_round_trips() {
        let db = TestDatabaseManager::new();
        let s = stimulus_fixture(StimulusType::Emotional, "feeling good");
        let persisted = db.seed_stimulus(s);
        assert_eq!(persisted.content, "feeling good");
        assert_eq!(db.storage.recent_stimuli(50).unwrap().len(), 1);
    }
}
