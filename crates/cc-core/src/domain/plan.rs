//! Plan / PlanStep (C12)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Active,
    Paused,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped | StepStatus::Failed)
    }

    /// Terminal states that count toward a Plan's `completed_steps` (§3: a
    /// plan's step is either completed or skipped, never failed, to count).
    pub fn counts_as_done(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }
}

/// A single work item within a Plan's DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub id: String,
    pub plan_id: String,
    pub step_order: u32,
    pub action_type: String,
    pub action_payload: serde_json::Value,
    pub dependencies: HashSet<u32>,
    pub status: StepStatus,
    pub optional: bool,
    pub result_data: Option<serde_json::Value>,
    pub retry_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PlanStep {
    pub fn new(
        plan_id: impl Into<String>,
        step_order: u32,
        action_type: impl Into<String>,
        action_payload: serde_json::Value,
        dependencies: HashSet<u32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            plan_id: plan_id.into(),
            step_order,
            action_type: action_type.into(),
            action_payload,
            dependencies,
            status: StepStatus::Pending,
            optional: false,
            result_data: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// A step is ready when pending and every dependency step_order appears
    /// in `completed_orders` (§4.9's iterative transition rule).
    pub fn is_ready(&self, completed_orders: &HashSet<u32>) -> bool {
        self.status == StepStatus::Pending && self.dependencies.iter().all(|d| completed_orders.contains(d))
    }
}

/// A DAG of Steps driven by the Planner (C12).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub status: PlanStatus,
    pub priority: i32,
    pub total_steps: u32,
    pub completed_steps: u32,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(name: impl Into<String>, priority: i32, total_steps: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            status: PlanStatus::Pending,
            priority,
            total_steps,
            completed_steps: 0,
            created_at: Utc::now(),
        }
    }

    /// Recompute status/completed_steps from a fresh read of its steps,
    /// enforcing the §3 invariant that `status = completed` iff every step
    /// is `completed` or `skipped`.
    pub fn reconcile(&mut self, steps: &[PlanStep]) {
        self.total_steps = steps.len() as u32;
        self.completed_steps = steps.iter().filter(|s| s.status.counts_as_done()).count() as u32;

        if self.status == PlanStatus::Paused {
            return;
        }

        let any_failed_required = steps
            .iter()
            .any(|s| s.status == StepStatus::Failed && !s.optional);

        if any_failed_required {
            self.status = PlanStatus::Failed;
        } else if self.completed_steps == self.total_steps && self.total_steps > 0 {
            self.status = PlanStatus::Completed;
        } else if steps.iter().any(|s| s.status != StepStatus::Pending) {
            self.status = PlanStatus::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(order: u32, deps: &[u32], status: StepStatus) -> PlanStep {
        let mut s = PlanStep::new("plan-1", order, "noop", serde_json::json!({}), deps.iter().copied().collect());
        s.status = status;
        s
    }

    #[test]
    fn plan_completes_when_all_steps_terminal_and_successful() {
        let mut plan = Plan::new("p", 0, 3);
        let steps = vec![
            step(1, &[], StepStatus::Completed),
            step(2, &[1], StepStatus::Completed),
            step(3, &[1], StepStatus::Skipped),
        ];
        plan.reconcile(&steps);
        assert_eq!(plan.status, PlanStatus::Completed);
        assert_eq!(plan.completed_steps, 3);
    }

    #[test]
    fn plan_fails_when_a_required_step_fails() {
        let mut plan = Plan::new("p", 0, 2);
        let steps = vec![step(1, &[], StepStatus::Completed), step(2, &[1], StepStatus::Failed)];
        plan.reconcile(&steps);
        assert_eq!(plan.status, PlanStatus::Failed);
    }

    #[test]
    fn optional_failed_step_does_not_fail_the_plan() {
        let mut plan = Plan::new("p", 0, 2);
        let mut s2 = step(2, &[1], StepStatus::Failed);
        s2.optional = true;
        let steps = vec![step(1, &[], StepStatus::Completed), s2];
        plan.reconcile(&steps);
        assert_ne!(plan.status, PlanStatus::Failed);
    }

    #[test]
    fn step_is_ready_only_once_all_dependencies_completed() {
        let s = step(2, &[1], StepStatus::Pending);
        assert!(!s.is_ready(&HashSet::new()));
        assert!(s.is_ready(&[1].into_iter().collect()));
    }
}
