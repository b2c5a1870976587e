//! ExpressionAttempt / QueuedExpression (C6, C7)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    Duplicate,
    RateLimit,
    Dnd,
    StateFilter,
    Quality,
    None,
}

impl SuppressReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressReason::Duplicate => "duplicate",
            SuppressReason::RateLimit => "rate_limit",
            SuppressReason::Dnd => "dnd",
            SuppressReason::StateFilter => "state_filter",
            SuppressReason::Quality => "quality",
            SuppressReason::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserResponse {
    Engaged,
    Acknowledged,
    Ignored,
    Dismissed,
    Unknown,
}

impl UserResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserResponse::Engaged => "engaged",
            UserResponse::Acknowledged => "acknowledged",
            UserResponse::Ignored => "ignored",
            UserResponse::Dismissed => "dismissed",
            UserResponse::Unknown => "unknown",
        }
    }
}

/// A durable record of one decision the Router (C6) made about a Thought.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionAttempt {
    pub id: String,
    pub thought_id: String,
    pub channel: String,
    pub message_sent: Option<String>,
    pub success: bool,
    pub suppress_reason: SuppressReason,
    pub detected_user_state: Option<String>,
    pub motivation_score: f32,
    pub user_response: UserResponse,
    pub effectiveness_score: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl ExpressionAttempt {
    pub fn suppressed(thought_id: impl Into<String>, motivation_score: f32, reason: SuppressReason) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thought_id: thought_id.into(),
            channel: "none".to_string(),
            message_sent: None,
            success: false,
            suppress_reason: reason,
            detected_user_state: None,
            motivation_score,
            user_response: UserResponse::Unknown,
            effectiveness_score: None,
            created_at: Utc::now(),
        }
    }

    pub fn emitted(
        thought_id: impl Into<String>,
        channel: impl Into<String>,
        message_sent: impl Into<String>,
        motivation_score: f32,
        success: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thought_id: thought_id.into(),
            channel: channel.into(),
            message_sent: Some(message_sent.into()),
            success,
            suppress_reason: SuppressReason::None,
            detected_user_state: None,
            motivation_score,
            user_response: UserResponse::Unknown,
            effectiveness_score: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuedExpressionStatus {
    Pending,
    Shown,
    Expired,
}

/// The UI-queue counterpart of an emission: written by C6, consumed and
/// advanced externally (§6's "indirect via Store writes by adapters").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedExpression {
    pub id: String,
    pub thought_id: String,
    pub message: String,
    pub status: QueuedExpressionStatus,
    pub shown_at: Option<DateTime<Utc>>,
    pub user_response: UserResponse,
    pub effectiveness_score: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl QueuedExpression {
    pub fn new(thought_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thought_id: thought_id.into(),
            message: message.into(),
            status: QueuedExpressionStatus::Pending,
            shown_at: None,
            user_response: UserResponse::Unknown,
            effectiveness_score: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this queued item should be dropped for being older than the
    /// configured show window (§3 lifecycle).
    pub fn has_expired(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.status == QueuedExpressionStatus::Pending && now - self.created_at > window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppressed_attempt_has_no_message_and_is_unsuccessful() {
        let a = ExpressionAttempt::suppressed("t1", 0.85, SuppressReason::Dnd);
        assert!(!a.success);
        assert!(a.message_sent.is_none());
        assert_eq!(a.suppress_reason.as_str(), "dnd");
    }

    #[test]
    fn queued_expression_expires_after_window() {
        let mut q = QueuedExpression::new("t1", "hello");
        q.created_at = Utc::now() - chrono::Duration::hours(2);
        assert!(q.has_expired(Utc::now(), chrono::Duration::hours(1)));
        assert!(!q.has_expired(Utc::now(), chrono::Duration::hours(3)));
    }
}
