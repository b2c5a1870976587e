//! The five pattern families mined from recent episodic data (§4.7).

use crate::domain::{Stimulus, StimulusType};
use chrono::{Duration, Timelike};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFamily {
    TimeOfDay,
    EmotionalCycle,
    TopicSequence,
    Activity,
    SessionDuration,
}

impl PatternFamily {
    pub fn all() -> [PatternFamily; 5] {
        [
            PatternFamily::TimeOfDay,
            PatternFamily::EmotionalCycle,
            PatternFamily::TopicSequence,
            PatternFamily::Activity,
            PatternFamily::SessionDuration,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternFamily::TimeOfDay => "time_of_day",
            PatternFamily::EmotionalCycle => "emotional_cycle",
            PatternFamily::TopicSequence => "topic_sequence",
            PatternFamily::Activity => "activity",
            PatternFamily::SessionDuration => "session_duration",
        }
    }

    /// How far into the future a prediction from this family should be
    /// anchored; families that describe structure rather than timing (e.g.
    /// topic sequences) return `None` and never produce a Prediction.
    pub fn predicted_offset(&self) -> Option<Duration> {
        match self {
            PatternFamily::TimeOfDay => Some(Duration::hours(24)),
            PatternFamily::EmotionalCycle => Some(Duration::hours(12)),
            PatternFamily::TopicSequence => None,
            PatternFamily::Activity => Some(Duration::hours(6)),
            PatternFamily::SessionDuration => None,
        }
    }

    pub fn mine(&self, recent: &[Stimulus]) -> Vec<DetectedPattern> {
        match self {
            PatternFamily::TimeOfDay => mine_time_of_day(recent),
            PatternFamily::EmotionalCycle => mine_emotional_cycle(recent),
            PatternFamily::TopicSequence => mine_topic_sequence(recent),
            PatternFamily::Activity => mine_activity(recent),
            PatternFamily::SessionDuration => mine_session_duration(recent),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectedPattern {
    pub family: PatternFamily,
    pub structural_key: String,
    pub description: String,
    pub confidence: f32,
}

/// Confidence grows with repeat count but never exceeds what a handful of
/// observations can justify; five same-hour hits from a two-week window
/// max out near 0.9, not 1.0.
fn confidence_from_count(count: usize, min_support: usize) -> f32 {
    if count < min_support {
        return 0.0;
    }
    (0.5 + 0.08 * (count - min_support) as f32).min(0.9)
}

fn mine_time_of_day(recent: &[Stimulus]) -> Vec<DetectedPattern> {
    let mut by_hour: HashMap<u32, usize> = HashMap::new();
    for s in recent {
        *by_hour.entry(s.created_at.hour()).or_insert(0) += 1;
    }

    by_hour
        .into_iter()
        .map(|(hour, count)| DetectedPattern {
            family: PatternFamily::TimeOfDay,
            structural_key: format!("time_of_day:{hour}"),
            description: format!("activity cluster around hour {hour}"),
            confidence: confidence_from_count(count, 3),
        })
        .filter(|p| p.confidence > 0.0)
        .collect()
}

fn mine_emotional_cycle(recent: &[Stimulus]) -> Vec<DetectedPattern> {
    let count = recent.iter().filter(|s| s.stimulus_type == StimulusType::Emotional).count();
    if count < 3 {
        return vec![];
    }
    vec![DetectedPattern {
        family: PatternFamily::EmotionalCycle,
        structural_key: "emotional_cycle:recurrent".to_string(),
        description: "recurring emotional stimuli in the recent window".to_string(),
        confidence: confidence_from_count(count, 3),
    }]
}

fn mine_topic_sequence(recent: &[Stimulus]) -> Vec<DetectedPattern> {
    let mut bigram_counts: HashMap<(String, String), usize> = HashMap::new();
    for pair in recent.windows(2) {
        let key = (pair[0].source_codelet.clone(), pair[1].source_codelet.clone());
        *bigram_counts.entry(key).or_insert(0) += 1;
    }

    bigram_counts
        .into_iter()
        .map(|((a, b), count)| DetectedPattern {
            family: PatternFamily::TopicSequence,
            structural_key: format!("topic_sequence:{a}->{b}"),
            description: format!("{a} is often followed by {b}"),
            confidence: confidence_from_count(count, 2),
        })
        .filter(|p| p.confidence > 0.0)
        .collect()
}

fn mine_activity(recent: &[Stimulus]) -> Vec<DetectedPattern> {
    let mut by_source: HashMap<String, usize> = HashMap::new();
    for s in recent {
        *by_source.entry(s.source_codelet.clone()).or_insert(0) += 1;
    }

    by_source
        .into_iter()
        .map(|(source, count)| DetectedPattern {
            family: PatternFamily::Activity,
            structural_key: format!("activity:{source}"),
            description: format!("elevated activity from {source}"),
            confidence: confidence_from_count(count, 4),
        })
        .filter(|p| p.confidence > 0.0)
        .collect()
}

fn mine_session_duration(recent: &[Stimulus]) -> Vec<DetectedPattern> {
    if recent.len() < 2 {
        return vec![];
    }
    let span = recent.last().unwrap().created_at - recent.first().unwrap().created_at;
    if span < Duration::minutes(5) {
        return vec![];
    }
    vec![DetectedPattern {
        family: PatternFamily::SessionDuration,
        structural_key: "session_duration:window".to_string(),
        description: format!("recent engagement spans {} minutes", span.num_minutes()),
        confidence: confidence_from_count(recent.len(), 5),
    }]
}
