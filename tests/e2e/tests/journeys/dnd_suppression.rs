//! Scenario 1 (do-not-disturb suppression): a weekday DND window from
//! 00:00-06:00, a thought crossing the express threshold at 02:30, and the
//! expectation that the Router records a suppressed attempt rather than
//! emitting, leaving the thought `active`.

use cc_e2e_tests::harness::TestDatabaseManager;
use cc_e2e_tests::mocks::{stimulus_fixture, thought_with_motivation};
use cc_core::care::CarePolicy;
use cc_core::domain::{CareLimits, DndWindow, ExpressionAttempt, StimulusType, SuppressReason, ThoughtStatus};
use chrono::{NaiveTime, TimeZone, Utc};
use std::collections::HashMap;

#[test]
fn dnd_window_suppresses_emission_and_leaves_thought_active() {
    let db = TestDatabaseManager::new();

    let limits = CareLimits {
        dnd_weekday: vec![DndWindow::new(
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        )],
        dnd_weekend: vec![],
        daily_limits: HashMap::new(),
        cooldown_minutes: HashMap::new(),
    };
    let policy = CarePolicy::new(&limits);

    // 2026-07-29 is a Wednesday.
    let now = Utc.with_ymd_and_hms(2026, 7, 29, 2, 30, 0).unwrap();

    let stimulus = db.seed_stimulus(stimulus_fixture(StimulusType::Emotional, "feeling uneasy"));
    let thought = thought_with_motivation("checking in on you", vec![stimulus.id.clone()], 0.85);
    db.storage.insert_thought(&thought).expect("insert_thought failed");

    assert!(policy.in_dnd("care_message", now));

    let attempt = ExpressionAttempt::suppressed(thought.id.clone(), thought.motivation_score, SuppressReason::Dnd);
    db.storage
        .record_expression_decision(&attempt, "care_message")
        .expect("record_expression_decision failed");

    let active = db.storage.active_thoughts_by_motivation_desc().expect("query failed");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, ThoughtStatus::Active);
}

#[test]
fn dnd_window_boundaries_are_half_open() {
    let limits = CareLimits {
        dnd_weekday: vec![DndWindow::new(
            NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        )],
        dnd_weekend: vec![],
        daily_limits: HashMap::new(),
        cooldown_minutes: HashMap::new(),
    };
    let policy = CarePolicy::new(&limits);

    let at_2300 = Utc.with_ymd_and_hms(2026, 7, 29, 23, 0, 0).unwrap();
    let at_0559_59 = Utc.with_ymd_and_hms(2026, 7, 30, 5, 59, 59).unwrap();
    let at_0600 = Utc.with_ymd_and_hms(2026, 7, 30, 6, 0, 0).unwrap();

    assert!(policy.in_dnd("care_message", at_2300));
    assert!(policy.in_dnd("care_message", at_0559_59));
    assert!(!policy.in_dnd("care_message", at_0600));
}
