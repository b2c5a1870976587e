//! Salience Scorer (C4)
//!
//! Scores each freshly-sensed `Stimulus` along five weighted dimensions and
//! writes the composite score and per-dimension breakdown back onto it
//! (§4.2). Novelty degrades gracefully to lexical overlap when embeddings
//! are unavailable, rather than failing the tick.

use crate::config::SalienceWeights;
use crate::domain::Stimulus;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[cfg(feature = "embeddings")]
use crate::embeddings::{cosine_similarity, Embedding};

/// How far ahead of a deadline temporal_urgency starts decaying from 1.0
/// down toward 0 as the deadline approaches (§4.2).
const URGENCY_HORIZON_HOURS: i64 = 24;

pub struct SalienceScorer {
    weights: SalienceWeights,
}

impl SalienceScorer {
    pub fn new(weights: SalienceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SalienceWeights {
        &self.weights
    }

    /// Replace the dimension weights, used by Evolution (C9, §4.8) to apply
    /// a bounded tuning step.
    pub fn set_weights(&mut self, weights: SalienceWeights) {
        self.weights = weights;
    }

    /// Score `stimulus` against recently-seen stimuli (for novelty) and an
    /// active-goals set (for goal_relevance), writing
    /// `salience_score`/`salience_breakdown` onto it in place.
    pub fn score(&self, stimulus: &mut Stimulus, recent: &[Stimulus], active_goals: &[String]) {
        let breakdown = self.breakdown(stimulus, recent, active_goals);
        let score = self.weighted(&breakdown);
        stimulus.salience_score = score;
        stimulus.salience_breakdown = breakdown;
    }

    fn breakdown(&self, stimulus: &Stimulus, recent: &[Stimulus], active_goals: &[String]) -> HashMap<String, f32> {
        let mut b = HashMap::new();
        b.insert("novelty".to_string(), self.novelty(stimulus, recent));
        b.insert("emotional".to_string(), emotional(stimulus));
        b.insert("goalRelevance".to_string(), goal_relevance(stimulus, active_goals));
        b.insert("temporalUrgency".to_string(), temporal_urgency(stimulus));
        b.insert("socialRelevance".to_string(), social_relevance(stimulus));
        b
    }

    fn weighted(&self, breakdown: &HashMap<String, f32>) -> f32 {
        let w = &self.weights;
        (w.novelty * breakdown.get("novelty").copied().unwrap_or(0.0)
            + w.emotional * breakdown.get("emotional").copied().unwrap_or(0.0)
            + w.goal_relevance * breakdown.get("goalRelevance").copied().unwrap_or(0.0)
            + w.temporal_urgency * breakdown.get("temporalUrgency").copied().unwrap_or(0.0)
            + w.social_relevance * breakdown.get("socialRelevance").copied().unwrap_or(0.0))
        .clamp(0.0, 1.0)
    }

    /// 1 minus the highest similarity against recent stimuli content — a
    /// repeated stimulus is not novel. Uses embedding cosine similarity when
    /// the `embeddings` feature is on; otherwise falls back to a normalized
    /// edit distance over the raw text (§4.2).
    fn novelty(&self, stimulus: &Stimulus, recent: &[Stimulus]) -> f32 {
        if recent.is_empty() {
            return 1.0;
        }

        let max_similarity = recent
            .iter()
            .map(|r| lexical_overlap(&stimulus.content, &r.content))
            .fold(0.0_f32, f32::max);

        (1.0 - max_similarity).clamp(0.0, 1.0)
    }
}

/// Explicit field from `raw_data`, default 0 if absent (§4.2).
fn emotional(stimulus: &Stimulus) -> f32 {
    stimulus.raw_data.get("intensity").and_then(|v| v.as_f64()).map(|f| f as f32).unwrap_or(0.0)
}

/// Explicit field from `raw_data`, default 0 if absent (§4.2).
fn social_relevance(stimulus: &Stimulus) -> f32 {
    stimulus.raw_data.get("socialWeight").and_then(|v| v.as_f64()).map(|f| f as f32).unwrap_or(0.0)
}

/// Scored against the active-goals set the codelet context carries: an
/// explicit `raw_data.goal` naming a currently tracked goal scores 0.8,
/// otherwise 0 (§4.2).
fn goal_relevance(stimulus: &Stimulus, active_goals: &[String]) -> f32 {
    match stimulus.raw_data.get("goal").and_then(|v| v.as_str()) {
        Some(goal) if active_goals.iter().any(|g| g == goal) => 0.8,
        _ => 0.0,
    }
}

/// Linear decay from 1.0 at `URGENCY_HORIZON_HOURS` or more away from
/// `raw_data.deadline` down to 0 at (or past) the deadline itself; 0 if no
/// deadline field is present (§4.2).
fn temporal_urgency(stimulus: &Stimulus) -> f32 {
    let Some(deadline) = stimulus.raw_data.get("deadline").and_then(|v| v.as_str()) else {
        return 0.0;
    };
    let Ok(deadline) = DateTime::parse_from_rfc3339(deadline).map(|d| d.with_timezone(&Utc)) else {
        return 0.0;
    };

    let remaining_hours = (deadline - stimulus.created_at).num_minutes() as f32 / 60.0;
    if remaining_hours <= 0.0 {
        return 1.0;
    }
    (1.0 - remaining_hours / URGENCY_HORIZON_HOURS as f32).clamp(0.0, 1.0)
}

#[cfg(feature = "embeddings")]
pub fn semantic_novelty(query: &Embedding, recent: &[Embedding]) -> f32 {
    if recent.is_empty() {
        return 1.0;
    }
    let max_sim = recent
        .iter()
        .map(|e| cosine_similarity(&query.vector, &e.vector))
        .fold(f32::MIN, f32::max);
    (1.0 - max_sim).clamp(0.0, 1.0)
}

/// Similarity as 1 minus the normalized Levenshtein edit distance between
/// `a` and `b`, the §4.2 fallback when no embedding is available.
fn lexical_overlap(a: &str, b: &str) -> f32 {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f32 / max_len as f32)
}

/// Classic Wagner-Fischer edit distance over `char`s.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StimulusType;

    #[test]
    fn repeated_content_scores_low_novelty() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let prior = Stimulus::new(StimulusType::Temporal, "drink water now", "t", serde_json::json!({}));
        let mut fresh = Stimulus::new(StimulusType::Temporal, "drink water now", "t", serde_json::json!({}));

        scorer.score(&mut fresh, &[prior], &[]);
        assert!(fresh.salience_breakdown["novelty"] < 0.3);
    }

    #[test]
    fn first_stimulus_of_its_kind_is_fully_novel() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let mut fresh = Stimulus::new(StimulusType::Goal, "ship the report", "g", serde_json::json!({}));
        scorer.score(&mut fresh, &[], &[]);
        assert_eq!(fresh.salience_breakdown["novelty"], 1.0);
    }

    #[test]
    fn composite_score_is_bounded() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let mut s = Stimulus::new(StimulusType::Emotional, "very upset", "e", serde_json::json!({ "intensity": 1.5 }));
        scorer.score(&mut s, &[], &[]);
        assert!((0.0..=1.0).contains(&s.salience_score));
    }

    #[test]
    fn emotional_and_social_default_to_zero_without_explicit_fields() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let mut s = Stimulus::new(StimulusType::Emotional, "something happened", "e", serde_json::json!({}));
        scorer.score(&mut s, &[], &[]);
        assert_eq!(s.salience_breakdown["emotional"], 0.0);
        assert_eq!(s.salience_breakdown["socialRelevance"], 0.0);
    }

    #[test]
    fn goal_relevance_requires_matching_an_active_goal() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let mut matching = Stimulus::new(StimulusType::Goal, "goal stalled: ship report", "goal", serde_json::json!({ "goal": "ship report" }));
        scorer.score(&mut matching, &[], &["ship report".to_string()]);
        assert_eq!(matching.salience_breakdown["goalRelevance"], 0.8);

        let mut unrelated = Stimulus::new(StimulusType::Goal, "goal stalled: ship report", "goal", serde_json::json!({ "goal": "ship report" }));
        scorer.score(&mut unrelated, &[], &["unrelated goal".to_string()]);
        assert_eq!(unrelated.salience_breakdown["goalRelevance"], 0.0);
    }

    #[test]
    fn temporal_urgency_decays_linearly_toward_the_deadline() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let now = Utc::now();
        let mut far = Stimulus::new(StimulusType::Calendar, "event", "calendar", serde_json::json!({ "deadline": (now + chrono::Duration::hours(48)).to_rfc3339() }));
        far.created_at = now;
        let mut near = Stimulus::new(StimulusType::Calendar, "event", "calendar", serde_json::json!({ "deadline": (now + chrono::Duration::hours(1)).to_rfc3339() }));
        near.created_at = now;

        scorer.score(&mut far, &[], &[]);
        scorer.score(&mut near, &[], &[]);
        assert!(near.salience_breakdown["temporalUrgency"] > far.salience_breakdown["temporalUrgency"]);
    }

    #[test]
    fn missing_deadline_is_zero_urgency() {
        let scorer = SalienceScorer::new(SalienceWeights::default());
        let mut s = Stimulus::new(StimulusType::Other, "x", "o", serde_json::json!({}));
        scorer.score(&mut s, &[], &[]);
        assert_eq!(s.salience_breakdown["temporalUrgency"], 0.0);
    }
}
