//! Thought (C5 output, C6 transitions)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtType {
    System1,
    System2,
}

impl ThoughtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThoughtType::System1 => "system1",
            ThoughtType::System2 => "system2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtStatus {
    Active,
    Expressed,
    Decayed,
    Evolved,
}

impl ThoughtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThoughtStatus::Active => "active",
            ThoughtStatus::Expressed => "expressed",
            ThoughtStatus::Decayed => "decayed",
            ThoughtStatus::Evolved => "evolved",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "expressed" => ThoughtStatus::Expressed,
            "decayed" => ThoughtStatus::Decayed,
            "evolved" => ThoughtStatus::Evolved,
            _ => ThoughtStatus::Active,
        }
    }
}

/// The five weighted components of a Thought's motivation score (§4.3).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotivationBreakdown {
    pub relevance: f32,
    pub urgency: f32,
    pub impact: f32,
    pub coherence: f32,
    pub originality: f32,
}

impl MotivationBreakdown {
    /// `0.25*relevance + 0.20*urgency + 0.25*impact + 0.15*coherence + 0.15*originality`
    pub fn weighted_score(&self) -> f32 {
        0.25 * self.relevance.clamp(0.0, 1.0)
            + 0.20 * self.urgency.clamp(0.0, 1.0)
            + 0.25 * self.impact.clamp(0.0, 1.0)
            + 0.15 * self.coherence.clamp(0.0, 1.0)
            + 0.15 * self.originality.clamp(0.0, 1.0)
    }
}

/// An internal candidate utterance produced from one or more stimuli.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: String,
    #[serde(rename = "type")]
    pub thought_type: ThoughtType,
    pub content: String,
    pub stimulus_ids: Vec<String>,
    pub memory_context: serde_json::Value,
    pub motivation_score: f32,
    pub motivation_breakdown: MotivationBreakdown,
    pub status: ThoughtStatus,
    pub evolved_from: Option<String>,
    pub expressed_via: Option<String>,
    pub expressed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Thought {
    pub fn new(
        thought_type: ThoughtType,
        content: impl Into<String>,
        stimulus_ids: Vec<String>,
        breakdown: MotivationBreakdown,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thought_type,
            content: content.into(),
            stimulus_ids,
            memory_context: serde_json::json!({}),
            motivation_score: breakdown.weighted_score(),
            motivation_breakdown: breakdown,
            status: ThoughtStatus::Active,
            evolved_from: None,
            expressed_via: None,
            expressed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_eligible_for_expression(&self, threshold: f32) -> bool {
        self.status == ThoughtStatus::Active && self.motivation_score >= threshold
    }

    /// Normalized content, used by the router's duplicate gate (§4.4).
    pub fn normalized_content(&self) -> String {
        self.content.trim().to_lowercase()
    }
}
