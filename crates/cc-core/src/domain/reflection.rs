//! Reflection / ConsolidationLogEntry / PreferencePair (C10)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionType {
    Insight,
    Question,
    Realization,
    Growth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionStatus {
    Active,
    Integrated,
    Superseded,
}

/// A higher-order abstraction produced from clustered episodic events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub id: String,
    #[serde(rename = "type")]
    pub reflection_type: ReflectionType,
    pub content: String,
    pub trigger_summary: String,
    pub importance_sum: f32,
    pub source_thought_ids: Vec<String>,
    pub source_emotion_ids: Vec<String>,
    pub depth_level: u32,
    pub parent_reflection_id: Option<String>,
    pub status: ReflectionStatus,
    pub integrated_into: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reflection {
    pub fn new(
        reflection_type: ReflectionType,
        content: impl Into<String>,
        trigger_summary: impl Into<String>,
        importance_sum: f32,
        source_thought_ids: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reflection_type,
            content: content.into(),
            trigger_summary: trigger_summary.into(),
            importance_sum,
            source_thought_ids,
            source_emotion_ids: Vec::new(),
            depth_level: 1,
            parent_reflection_id: None,
            status: ReflectionStatus::Active,
            integrated_into: None,
            created_at: Utc::now(),
        }
    }

    /// A nested reflection formed by clustering earlier reflections.
    pub fn nested_from(parent: &Reflection, content: impl Into<String>, importance_sum: f32) -> Self {
        let mut r = Self::new(
            ReflectionType::Insight,
            content,
            format!("derived from reflection {}", parent.id),
            importance_sum,
            Vec::new(),
        );
        r.depth_level = parent.depth_level + 1;
        r.parent_reflection_id = Some(parent.id.clone());
        r
    }
}

/// One row per consolidated cluster (§4.6); the idempotence key is the hash
/// of `source_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationLogEntry {
    pub id: String,
    pub source_type: String,
    pub source_count: u32,
    pub topic_cluster: String,
    pub abstraction: String,
    pub target_type: String,
    pub target_id: String,
    pub confidence: f32,
    pub source_ids: Vec<String>,
    pub source_set_hash: String,
    pub created_at: DateTime<Utc>,
}

impl ConsolidationLogEntry {
    /// Stable hash of the source id set, order-independent, used to dedupe
    /// reruns of the Consolidator over the same cluster (§4.6 invariant).
    pub fn hash_source_ids(source_ids: &[String]) -> String {
        let mut sorted: Vec<&str> = source_ids.iter().map(|s| s.as_str()).collect();
        sorted.sort_unstable();
        let joined = sorted.join(",");
        format!("{:x}", md5_like_hash(joined.as_bytes()))
    }
}

/// Small non-cryptographic hash (FNV-1a) used only for dedup keys — not a
/// security primitive.
fn md5_like_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Written when a correction is observed (C8/C9): a preferred response beat
/// a rejected one for the same input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencePair {
    pub id: String,
    pub user_message: String,
    pub preferred_response: String,
    pub rejected_response: String,
    pub preference_strength: f32,
    pub created_at: DateTime<Utc>,
}

impl PreferencePair {
    pub fn new(
        user_message: impl Into<String>,
        preferred_response: impl Into<String>,
        rejected_response: impl Into<String>,
        preference_strength: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_message: user_message.into(),
            preferred_response: preferred_response.into(),
            rejected_response: rejected_response.into(),
            preference_strength: preference_strength.clamp(0.0, 1.0),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_hash_is_order_independent() {
        let a = ConsolidationLogEntry::hash_source_ids(&["x".into(), "y".into(), "z".into()]);
        let b = ConsolidationLogEntry::hash_source_ids(&["z".into(), "x".into(), "y".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn source_hash_differs_for_different_sets() {
        let a = ConsolidationLogEntry::hash_source_ids(&["x".into(), "y".into()]);
        let b = ConsolidationLogEntry::hash_source_ids(&["x".into(), "y".into(), "z".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn nested_reflection_increments_depth() {
        let parent = Reflection::new(ReflectionType::Insight, "content", "trigger", 2.0, vec![]);
        let child = Reflection::nested_from(&parent, "deeper insight", 1.0);
        assert_eq!(child.depth_level, parent.depth_level + 1);
        assert_eq!(child.parent_reflection_id.as_deref(), Some(parent.id.as_str()));
    }
}
