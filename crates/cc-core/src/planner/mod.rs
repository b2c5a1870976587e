//! Planner / Step Executor (C12, §4.9)
//!
//! Drives one Plan's DAG forward by one tick: every step whose dependencies
//! are all done is dispatched, its outcome recorded, and the Plan's status
//! reconciled from the resulting step set. The driver holds no state of its
//! own between ticks; all of it lives in the Plan/PlanStep rows a caller
//! reads from and writes back to storage.

use crate::domain::{Plan, PlanStep, StepStatus};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// What a dispatched step produced. `Dispatcher` impls translate this from
/// whatever the Tool Registry or Router actually returned.
pub struct StepOutcome {
    pub success: bool,
    pub result_data: Option<serde_json::Value>,
}

/// Executes one step's `action_type`/`action_payload`, routing to the Tool
/// Registry (C13) or the Expression Router (C6) depending on the action.
/// Implemented by the caller, which owns both of those.
pub trait StepDispatcher {
    fn dispatch(&mut self, step: &PlanStep) -> StepOutcome;
}

/// Steps whose dependencies are all satisfied by already-done steps, in
/// `step_order`.
pub fn ready_steps(steps: &[PlanStep]) -> Vec<&PlanStep> {
    let completed_orders: HashSet<u32> = steps.iter().filter(|s| s.status.counts_as_done()).map(|s| s.step_order).collect();

    let mut ready: Vec<&PlanStep> = steps.iter().filter(|s| s.is_ready(&completed_orders)).collect();
    ready.sort_by_key(|s| s.step_order);
    ready
}

/// Advance `plan` by one tick: dispatch every currently-ready step, apply
/// its outcome (retry/skip/fail per §4.9), then reconcile the plan's
/// overall status. Returns the step_orders that were dispatched this tick,
/// so the caller knows which rows to persist.
pub fn drive_tick(plan: &mut Plan, steps: &mut [PlanStep], dispatcher: &mut dyn StepDispatcher, max_retries: u32, now: DateTime<Utc>) -> Vec<u32> {
    if plan.status == crate::domain::PlanStatus::Paused {
        return Vec::new();
    }

    let ready_orders: Vec<u32> = ready_steps(steps).into_iter().map(|s| s.step_order).collect();
    let mut dispatched = Vec::new();

    for order in ready_orders {
        let idx = steps.iter().position(|s| s.step_order == order).expect("order came from this slice");
        let outcome = {
            let step = &mut steps[idx];
            step.status = StepStatus::Running;
            step.started_at = Some(now);
            dispatcher.dispatch(step)
        };
        apply_outcome(&mut steps[idx], outcome, max_retries, now);
        dispatched.push(order);
    }

    plan.reconcile(steps);
    dispatched
}

fn apply_outcome(step: &mut PlanStep, outcome: StepOutcome, max_retries: u32, now: DateTime<Utc>) {
    if outcome.success {
        step.status = StepStatus::Completed;
        step.result_data = outcome.result_data;
        step.completed_at = Some(now);
        return;
    }

    step.retry_count += 1;
    if step.retry_count <= max_retries {
        step.status = StepStatus::Pending;
        step.started_at = None;
        return;
    }

    step.result_data = outcome.result_data;
    step.completed_at = Some(now);
    step.status = if step.optional { StepStatus::Skipped } else { StepStatus::Failed };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlanStatus;

    struct AlwaysFails;
    impl StepDispatcher for AlwaysFails {
        fn dispatch(&mut self, _step: &PlanStep) -> StepOutcome {
            StepOutcome { success: false, result_data: None }
        }
    }

    struct AlwaysSucceeds;
    impl StepDispatcher for AlwaysSucceeds {
        fn dispatch(&mut self, _step: &PlanStep) -> StepOutcome {
            StepOutcome { success: true, result_data: Some(serde_json::json!({"ok": true})) }
        }
    }

    fn step(order: u32, deps: &[u32]) -> PlanStep {
        PlanStep::new("plan-1", order, "noop", serde_json::json!({}), deps.iter().copied().collect())
    }

    #[test]
    fn dependent_step_only_ready_after_dependency_completes() {
        let steps = vec![step(1, &[]), step(2, &[1])];
        let ready = ready_steps(&steps);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].step_order, 1);
    }

    #[test]
    fn successful_dispatch_advances_step_and_unblocks_dependents() {
        let mut plan = Plan::new("p", 0, 2);
        let mut steps = vec![step(1, &[]), step(2, &[1])];
        let mut dispatcher = AlwaysSucceeds;
        let now = Utc::now();

        drive_tick(&mut plan, &mut steps, &mut dispatcher, 3, now);
        assert_eq!(steps[0].status, StepStatus::Completed);
        assert_eq!(steps[1].status, StepStatus::Pending);

        drive_tick(&mut plan, &mut steps, &mut dispatcher, 3, now);
        assert_eq!(steps[1].status, StepStatus::Completed);
        assert_eq!(plan.status, PlanStatus::Completed);
    }

    #[test]
    fn exhausted_retries_fail_required_step_and_plan() {
        let mut plan = Plan::new("p", 0, 1);
        let mut steps = vec![step(1, &[])];
        let mut dispatcher = AlwaysFails;
        let now = Utc::now();

        for _ in 0..=1 {
            drive_tick(&mut plan, &mut steps, &mut dispatcher, 1, now);
        }

        assert_eq!(steps[0].status, StepStatus::Failed);
        assert_eq!(plan.status, PlanStatus::Failed);
    }

    #[test]
    fn exhausted_retries_on_optional_step_skip_instead_of_fail() {
        let mut plan = Plan::new("p", 0, 1);
        let mut steps = vec![step(1, &[])];
        steps[0].optional = true;
        let mut dispatcher = AlwaysFails;
        let now = Utc::now();

        for _ in 0..=1 {
            drive_tick(&mut plan, &mut steps, &mut dispatcher, 1, now);
        }

        assert_eq!(steps[0].status, StepStatus::Skipped);
        assert_ne!(plan.status, PlanStatus::Failed);
    }

    #[test]
    fn paused_plan_does_not_dispatch() {
        let mut plan = Plan::new("p", 0, 1);
        plan.status = PlanStatus::Paused;
        let mut steps = vec![step(1, &[])];
        let mut dispatcher = AlwaysSucceeds;
        let dispatched = drive_tick(&mut plan, &mut steps, &mut dispatcher, 1, Utc::now());
        assert!(dispatched.is_empty());
        assert_eq!(steps[0].status, StepStatus::Pending);
    }
}
