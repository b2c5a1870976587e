//! Scenario 5 (reward aggregation with a missing component): an explicit
//! praise signal and a self-evaluation score, no implicit follow-up
//! observed, redistributes the missing weight proportionally and persists
//! the resulting RewardSignal row.

use cc_core::domain::{RewardSignal, RewardWeights};
use cc_core::reward::ExplicitSource;
use cc_e2e_tests::harness::TestDatabaseManager;

#[test]
fn missing_implicit_component_redistributes_weight_and_persists() {
    let db = TestDatabaseManager::new();

    let signal = RewardSignal::aggregate(
        "attempt-1",
        ExplicitSource::Praise.score(),
        None,
        Some(0.7),
        Some(ExplicitSource::Praise.as_str().to_string()),
        Some("neutral".to_string()),
        None,
        RewardWeights::default(),
    );

    let expected = (0.4 * 0.8 + 0.3 * 0.7) / (0.4 + 0.3);
    assert!((signal.combined_reward - expected).abs() < 1e-6, "got {}, expected {expected}", signal.combined_reward);
    assert_eq!(signal.explicit_source.as_deref(), Some("praise"));
    assert_eq!(signal.implicit_classification.as_deref(), Some("neutral"));
    assert_eq!(signal.self_eval_score, Some(0.7));

    db.storage.insert_reward_signal(&signal).expect("insert_reward_signal failed");
    let trend = db.storage.recent_reward_trend(10).expect("recent_reward_trend failed");
    assert_eq!(trend.len(), 1);
    assert!((trend[0] - expected).abs() < 1e-6);
}
