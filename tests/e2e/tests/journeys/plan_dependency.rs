//! Scenario 4 (plan with dependency): three no-op steps, S2 and S3 both
//! depending on S1, all complete within a single tick of the driver once
//! S1's completion unblocks its dependents in the same pass.

use cc_core::domain::{Plan, PlanStatus, PlanStep, StepStatus};
use cc_core::planner::{drive_tick, StepDispatcher, StepOutcome};
use cc_e2e_tests::harness::TestDatabaseManager;
use chrono::Utc;
use std::collections::HashSet;

struct NoopDispatcher;
impl StepDispatcher for NoopDispatcher {
    fn dispatch(&mut self, _step: &PlanStep) -> StepOutcome {
        StepOutcome { success: true, result_data: None }
    }
}

#[test]
fn dependents_complete_same_tick_after_their_dependency() {
    let db = TestDatabaseManager::new();

    let mut plan = Plan::new("morning check-in plan", 0, 3);
    let mut steps = vec![
        PlanStep::new(plan.id.clone(), 1, "noop", serde_json::json!({}), HashSet::new()),
        PlanStep::new(plan.id.clone(), 2, "noop", serde_json::json!({}), HashSet::from([1])),
        PlanStep::new(plan.id.clone(), 3, "noop", serde_json::json!({}), HashSet::from([1])),
    ];
    db.seed_plan(&plan, &steps);

    let mut dispatcher = NoopDispatcher;
    let now = Utc::now();

    // A driver tick loops drive_tick to a fixpoint, not a single call, so
    // it can walk the whole dependency chain within one tick.
    for _ in 0..steps.len() {
        let dispatched = drive_tick(&mut plan, &mut steps, &mut dispatcher, 3, now);
        if dispatched.is_empty() {
            break;
        }
        for order in dispatched {
            let step = steps.iter().find(|s| s.step_order == order).unwrap();
            db.storage.transition_step(&plan, step).expect("transition_step failed");
        }
    }

    assert_eq!(plan.status, PlanStatus::Completed);
    assert_eq!(plan.completed_steps, 3);
    assert!(steps.iter().all(|s| s.status == StepStatus::Completed));

    let stored_plans = db.storage.active_plans().expect("active_plans failed");
    assert!(stored_plans.is_empty(), "a completed plan should no longer be active");
}
