//! Goal-progress stimuli: a tracked goal is stalled or approaching deadline.

use super::{Codelet, CodeletContext};
use crate::domain::{Stimulus, StimulusType};
use chrono::{DateTime, Utc};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct TrackedGoal {
    pub name: String,
    pub deadline: Option<DateTime<Utc>>,
    pub last_progress_at: DateTime<Utc>,
}

pub struct GoalCodelet {
    goals: Mutex<Vec<TrackedGoal>>,
    stall_threshold: chrono::Duration,
}

impl GoalCodelet {
    pub fn new(stall_threshold: chrono::Duration) -> Self {
        Self { goals: Mutex::new(Vec::new()), stall_threshold }
    }

    pub fn set_goals(&self, goals: Vec<TrackedGoal>) {
        *self.goals.lock().unwrap() = goals;
    }

    /// Names of every currently tracked goal, fed into `CodeletContext`'s
    /// active-goals set each SENSE tick.
    pub fn active_goal_names(&self) -> Vec<String> {
        self.goals.lock().unwrap().iter().map(|g| g.name.clone()).collect()
    }
}

impl Codelet for GoalCodelet {
    fn name(&self) -> &'static str {
        "goal"
    }

    fn sense(&self, ctx: &CodeletContext) -> Result<Vec<Stimulus>, anyhow::Error> {
        let now = ctx.clock.now();
        let goals = self.goals.lock().unwrap();
        let mut out = Vec::new();

        for goal in goals.iter() {
            let stalled = now - goal.last_progress_at > self.stall_threshold;
            let deadline_near = goal
                .deadline
                .map(|d| d > now && d - now < chrono::Duration::hours(24))
                .unwrap_or(false);

            if stalled {
                out.push(Stimulus::new(
                    StimulusType::Goal,
                    format!("goal stalled: {}", goal.name),
                    self.name(),
                    serde_json::json!({ "goal": goal.name, "reason": "stalled" }),
                ));
            } else if deadline_near {
                out.push(Stimulus::new(
                    StimulusType::Goal,
                    format!("goal deadline approaching: {}", goal.name),
                    self.name(),
                    serde_json::json!({
                        "goal": goal.name,
                        "reason": "deadline",
                        "deadline": goal.deadline.map(|d| d.to_rfc3339()),
                    }),
                ));
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;
    use std::sync::Arc;

    #[test]
    fn stalled_goal_emits_stimulus() {
        let codelet = GoalCodelet::new(chrono::Duration::days(3));
        let now = Utc::now();
        codelet.set_goals(vec![TrackedGoal {
            name: "ship report".into(),
            deadline: None,
            last_progress_at: now - chrono::Duration::days(5),
        }]);

        let ctx = CodeletContext { clock: Arc::new(TestClock::at(now)), active_goals: Vec::new() };
        let stimuli = codelet.sense(&ctx).unwrap();
        assert_eq!(stimuli.len(), 1);
    }
}
