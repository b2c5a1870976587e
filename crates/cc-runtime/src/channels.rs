//! Channels (§6): named external sinks the Router hands an emitted message
//! to. A channel's only contract is `send(payload) -> {delivered, message_id}`;
//! the runtime never inspects how delivery happens on the other side.

use std::collections::HashMap;

/// What a channel reports back about one delivery attempt.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub delivered: bool,
    pub message_id: Option<String>,
}

pub trait Channel: Send + Sync {
    fn name(&self) -> &'static str;
    fn send(&self, payload: &str) -> SendOutcome;
}

/// Logs the payload instead of delivering it anywhere. Stands in for the
/// long-form messenger and email channels named in §6 until real adapters
/// are wired; the Router's behavior is identical either way since it only
/// reacts to `delivered`.
pub struct LoggingChannel {
    name: &'static str,
}

impl LoggingChannel {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Channel for LoggingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn send(&self, payload: &str) -> SendOutcome {
        tracing::info!(channel = self.name, payload, "delivered");
        SendOutcome {
            delivered: true,
            message_id: Some(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// The UI-queue channel doesn't deliver anywhere itself; a Thought routed
/// to `enqueue_for_ui` is written to `queued_expressions` by the cycle
/// driver instead of going through a `Channel` at all (§6: "UI queue...
/// internal"). This registry only holds the channels the Router can pick
/// by name.
pub struct ChannelRegistry {
    channels: HashMap<String, Box<dyn Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self { channels: HashMap::new() }
    }

    pub fn register(&mut self, channel: Box<dyn Channel>) {
        self.channels.insert(channel.name().to_string(), channel);
    }

    pub fn send(&self, channel: &str, payload: &str) -> SendOutcome {
        match self.channels.get(channel) {
            Some(c) => c.send(payload),
            None => {
                tracing::warn!(channel, "no adapter registered, treating as undelivered");
                SendOutcome { delivered: false, message_id: None }
            }
        }
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_registry() -> ChannelRegistry {
    let mut registry = ChannelRegistry::new();
    registry.register(Box::new(LoggingChannel::new("messenger")));
    registry.register(Box::new(LoggingChannel::new("email")));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_channel_reports_undelivered() {
        let registry = ChannelRegistry::new();
        let outcome = registry.send("carrier_pigeon", "hi");
        assert!(!outcome.delivered);
    }

    #[test]
    fn logging_channel_always_delivers() {
        let registry = default_registry();
        let outcome = registry.send("messenger", "hi");
        assert!(outcome.delivered);
        assert!(outcome.message_id.is_some());
    }
}
