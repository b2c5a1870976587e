//! Tool Registry & Executor (C13, §4.10)
//!
//! A map from `tool_name` to `ToolDescriptor` plus whatever implements its
//! side effect. Execution validates params against the descriptor's schema
//! and gates confirmation-required tools on an explicit approval token
//! before invoking anything.

mod schema;

pub use schema::validate_against_schema;

use crate::domain::ToolDescriptor;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),
    #[error("tool {0} is disabled")]
    Disabled(String),
    #[error("tool {tool} requires confirmation but no approval token was supplied")]
    RequiresConfirmation { tool: String },
    #[error("params failed schema validation: {0}")]
    InvalidParams(String),
    #[error("tool {tool} execution failed: {source}")]
    ExecutionFailed {
        tool: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A side effect a tool performs. Implementors should be quick; anything
/// genuinely long-running should report back through its own channel rather
/// than block the cycle driver.
pub trait ToolHandler: Send + Sync {
    fn invoke(&self, params: &serde_json::Value) -> Result<serde_json::Value, anyhow::Error>;
}

/// Result of one `execute` call, ready to be written to the execution log.
pub struct ExecutionRecord {
    pub tool_name: String,
    pub duration: Duration,
    pub succeeded: bool,
    pub result_summary: String,
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Box<dyn ToolHandler>,
}

pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, descriptor: ToolDescriptor, handler: Box<dyn ToolHandler>) {
        self.tools.insert(descriptor.name.clone(), RegisteredTool { descriptor, handler });
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    /// Execute a registered tool. `approval_token` must be `Some` for any
    /// tool with `requires_confirmation = true`; the token's contents are
    /// not inspected here; possession of one is the caller's attestation
    /// that its own approval flow ran.
    pub fn execute(
        &mut self,
        name: &str,
        params: &serde_json::Value,
        approval_token: Option<&str>,
    ) -> Result<(serde_json::Value, ExecutionRecord), ToolError> {
        let entry = self.tools.get(name).ok_or_else(|| ToolError::Unknown(name.to_string()))?;

        if !entry.descriptor.enabled {
            return Err(ToolError::Disabled(name.to_string()));
        }
        if entry.descriptor.requires_confirmation && approval_token.is_none() {
            return Err(ToolError::RequiresConfirmation { tool: name.to_string() });
        }
        validate_against_schema(params, &entry.descriptor.parameters_schema)
            .map_err(ToolError::InvalidParams)?;

        let started = Instant::now();
        let outcome = entry.handler.invoke(params);
        let duration = started.elapsed();

        let entry = self.tools.get_mut(name).expect("checked above");
        let succeeded = outcome.is_ok();
        entry.descriptor.record_execution(succeeded);

        match outcome {
            Ok(result) => {
                let record = ExecutionRecord {
                    tool_name: name.to_string(),
                    duration,
                    succeeded: true,
                    result_summary: summarize(&result),
                };
                Ok((result, record))
            }
            Err(source) => Err(ToolError::ExecutionFailed { tool: name.to_string(), source }),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(value: &serde_json::Value) -> String {
    let rendered = value.to_string();
    if rendered.len() > 200 {
        format!("{}...", &rendered[..200])
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;
    impl ToolHandler for EchoHandler {
        fn invoke(&self, params: &serde_json::Value) -> Result<serde_json::Value, anyhow::Error> {
            Ok(params.clone())
        }
    }

    fn schema() -> serde_json::Value {
        serde_json::json!({ "type": "object", "required": ["message"] })
    }

    #[test]
    fn unapproved_confirmation_required_tool_has_no_side_effect() {
        let mut registry = ToolRegistry::new();
        let descriptor = ToolDescriptor::new("send_message", "messaging", schema()).requiring_confirmation();
        registry.register(descriptor, Box::new(EchoHandler));

        let result = registry.execute("send_message", &serde_json::json!({ "message": "hi" }), None);
        assert!(matches!(result, Err(ToolError::RequiresConfirmation { .. })));
        assert_eq!(registry.descriptor("send_message").unwrap().total_executions, 0);
    }

    #[test]
    fn approved_confirmation_required_tool_executes_and_increments_stats() {
        let mut registry = ToolRegistry::new();
        let descriptor = ToolDescriptor::new("send_message", "messaging", schema()).requiring_confirmation();
        registry.register(descriptor, Box::new(EchoHandler));

        let result = registry.execute("send_message", &serde_json::json!({ "message": "hi" }), Some("token"));
        assert!(result.is_ok());
        assert_eq!(registry.descriptor("send_message").unwrap().total_executions, 1);
        assert_eq!(registry.descriptor("send_message").unwrap().total_successes, 1);
    }

    #[test]
    fn params_missing_required_field_fail_validation_before_invocation() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDescriptor::new("send_message", "messaging", schema()), Box::new(EchoHandler));

        let result = registry.execute("send_message", &serde_json::json!({}), None);
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
        assert_eq!(registry.descriptor("send_message").unwrap().total_executions, 0);
    }

    #[test]
    fn unknown_tool_errors() {
        let mut registry = ToolRegistry::new();
        let result = registry.execute("nope", &serde_json::json!({}), None);
        assert!(matches!(result, Err(ToolError::Unknown(_))));
    }
}
