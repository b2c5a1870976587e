//! Scenario 2 (duplicate window): the same normalized content emitted once
//! successfully is suppressed as a duplicate within the dedup window, and
//! emits again once the window has elapsed.

use cc_e2e_tests::harness::TestDatabaseManager;
use cc_e2e_tests::mocks::thought_with_motivation;
use cc_core::domain::{ExpressionAttempt, SuppressReason};
use chrono::{Duration, Utc};

#[test]
fn duplicate_content_within_window_is_suppressed_then_allowed_after() {
    let db = TestDatabaseManager::new();
    let dedup_window = Duration::minutes(60);

    let first = thought_with_motivation("remember to hydrate", vec![], 0.8);
    db.storage.insert_thought(&first).expect("insert_thought failed");

    let emitted = ExpressionAttempt::emitted(first.id.clone(), "messenger", "remember to hydrate", 0.8, true);
    db.storage
        .record_expression_decision(&emitted, "hydration")
        .expect("record_expression_decision failed");

    let last = db
        .storage
        .last_successful_attempt_for_content(&first.normalized_content())
        .expect("query failed")
        .expect("a successful attempt should have been recorded");

    // A fresh stimulus 30 minutes later reproduces the identical normalized
    // content, still inside the 60-minute dedup window.
    let at_plus_30 = Utc::now() + Duration::minutes(30);
    assert!(at_plus_30 - last < dedup_window, "30 minutes later should still be inside the dedup window");

    let second = thought_with_motivation("remember to hydrate", vec![], 0.8);
    db.storage.insert_thought(&second).expect("insert_thought failed");
    let suppressed = ExpressionAttempt::suppressed(second.id.clone(), second.motivation_score, SuppressReason::Duplicate);
    db.storage
        .record_expression_decision(&suppressed, "hydration")
        .expect("record_expression_decision failed");

    // The duplicate attempt was suppressed, not delivered, so the second
    // thought never transitioned away from `active`.
    let active = db.storage.active_thoughts_by_motivation_desc().expect("query failed");
    assert!(active.iter().any(|t| t.id == second.id));

    // 65 minutes after the original emission the window has elapsed; a
    // third attempt for the same content would no longer be a duplicate.
    let at_plus_65 = Utc::now() + Duration::minutes(65);
    assert!(at_plus_65 - last >= dedup_window, "65 minutes later the window should have elapsed");
}
