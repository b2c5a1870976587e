//! Stimulus (C3 output, C4 scores)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The category a codelet tags its stimuli with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusType {
    Temporal,
    Emotional,
    Pattern,
    Calendar,
    Social,
    Goal,
    Anniversary,
    Other,
}

impl StimulusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StimulusType::Temporal => "temporal",
            StimulusType::Emotional => "emotional",
            StimulusType::Pattern => "pattern",
            StimulusType::Calendar => "calendar",
            StimulusType::Social => "social",
            StimulusType::Goal => "goal",
            StimulusType::Anniversary => "anniversary",
            StimulusType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "temporal" => StimulusType::Temporal,
            "emotional" => StimulusType::Emotional,
            "pattern" => StimulusType::Pattern,
            "calendar" => StimulusType::Calendar,
            "social" => StimulusType::Social,
            "goal" => StimulusType::Goal,
            "anniversary" => StimulusType::Anniversary,
            _ => StimulusType::Other,
        }
    }
}

/// A candidate perception awaiting attention, emitted by a codelet (C3) and
/// scored by the Salience Scorer (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stimulus {
    pub id: String,
    #[serde(rename = "type")]
    pub stimulus_type: StimulusType,
    pub content: String,
    pub source_codelet: String,
    pub raw_data: serde_json::Value,
    pub salience_score: f32,
    pub salience_breakdown: HashMap<String, f32>,
    pub acted_upon: bool,
    pub created_at: DateTime<Utc>,
}

impl Stimulus {
    /// Construct a freshly-emitted, not-yet-scored stimulus.
    pub fn new(
        stimulus_type: StimulusType,
        content: impl Into<String>,
        source_codelet: impl Into<String>,
        raw_data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stimulus_type,
            content: content.into(),
            source_codelet: source_codelet.into(),
            raw_data,
            salience_score: 0.0,
            salience_breakdown: HashMap::new(),
            acted_upon: false,
            created_at: Utc::now(),
        }
    }

    /// A content-identity hash used for dedup against stimuli still pending
    /// attention (§4.1: "same source, same content hash").
    pub fn content_hash(&self) -> String {
        format!("{}:{}", self.source_codelet, self.content.trim().to_lowercase())
    }
}
