//! ToolDescriptor (C13)

use serde::{Deserialize, Serialize};

/// A named, schema-validated external action invocable by the Planner or
/// Router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub category: String,
    pub parameters_schema: serde_json::Value,
    pub requires_confirmation: bool,
    pub cost_tier: u8,
    pub enabled: bool,
    pub total_executions: u64,
    pub total_successes: u64,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, category: impl Into<String>, parameters_schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            parameters_schema,
            requires_confirmation: false,
            cost_tier: 0,
            enabled: true,
            total_executions: 0,
            total_successes: 0,
        }
    }

    pub fn requiring_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }

    pub fn record_execution(&mut self, succeeded: bool) {
        self.total_executions += 1;
        if succeeded {
            self.total_successes += 1;
        }
    }

    pub fn success_rate(&self) -> f32 {
        if self.total_executions == 0 {
            0.0
        } else {
            self.total_successes as f32 / self.total_executions as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_zero_before_any_execution() {
        let t = ToolDescriptor::new("send_message", "messaging", serde_json::json!({}));
        assert_eq!(t.success_rate(), 0.0);
    }

    #[test]
    fn success_rate_tracks_recorded_outcomes() {
        let mut t = ToolDescriptor::new("send_message", "messaging", serde_json::json!({}));
        t.record_execution(true);
        t.record_execution(false);
        assert_eq!(t.total_executions, 2);
        assert!((t.success_rate() - 0.5).abs() < 1e-6);
    }
}
