//! Runtime Configuration
//!
//! A structured TOML document loaded at startup (§6's configuration table).
//! Unknown keys fail startup the same way `IngestInput`/`RecallInput` reject
//! unknown fields in the teacher crate — `deny_unknown_fields` at every
//! nested level.

use crate::domain::{CareLimits, DndWindow};
use chrono::NaiveTime;
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct CycleConfig {
    pub period_seconds: u64,
    pub phase_budget_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_seconds: 10,
            phase_budget_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct SenseConfig {
    pub top_k: usize,
}

impl Default for SenseConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SalienceWeights {
    pub novelty: f32,
    pub emotional: f32,
    pub goal_relevance: f32,
    pub temporal_urgency: f32,
    pub social_relevance: f32,
}

impl Default for SalienceWeights {
    fn default() -> Self {
        Self {
            novelty: 0.15,
            emotional: 0.30,
            goal_relevance: 0.25,
            temporal_urgency: 0.15,
            social_relevance: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct SalienceConfig {
    pub weights: SalienceWeights,
    pub novelty_lookback: u32,
}

impl Default for SalienceConfig {
    fn default() -> Self {
        Self {
            weights: SalienceWeights::default(),
            novelty_lookback: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct ThoughtConfig {
    pub s2_max_calls_per_tick: u32,
    pub s2_latency_ms: u64,
    /// Horizon after which an Active thought with no motivation lift decays
    /// (§3).
    pub idle_decay_minutes: i64,
}

impl Default for ThoughtConfig {
    fn default() -> Self {
        Self {
            s2_max_calls_per_tick: 2,
            s2_latency_ms: 8000,
            idle_decay_minutes: 1440,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct ExpressConfig {
    pub threshold: f32,
    pub quality_threshold: f32,
    pub dedup_window_min: i64,
}

impl Default for ExpressConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            quality_threshold: 0.7,
            dedup_window_min: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DndWindowConfig {
    pub start: String,
    pub end: String,
}

impl DndWindowConfig {
    pub fn parse(&self) -> Result<DndWindow, ConfigError> {
        let start = NaiveTime::parse_from_str(&self.start, "%H:%M")
            .map_err(|e| ConfigError::Parse(toml::de::Error::custom(e.to_string())))?;
        let end = NaiveTime::parse_from_str(&self.end, "%H:%M")
            .map_err(|e| ConfigError::Parse(toml::de::Error::custom(e.to_string())))?;
        Ok(DndWindow::new(start, end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct CareConfig {
    pub dnd_weekday: Vec<DndWindowConfig>,
    pub dnd_weekend: Vec<DndWindowConfig>,
    pub daily_limits: HashMap<String, u32>,
    pub cooldown_minutes: HashMap<String, i64>,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            dnd_weekday: vec![],
            dnd_weekend: vec![],
            daily_limits: HashMap::new(),
            cooldown_minutes: HashMap::new(),
        }
    }
}

impl CareConfig {
    pub fn to_limits(&self) -> Result<CareLimits, ConfigError> {
        Ok(CareLimits {
            dnd_weekday: self.dnd_weekday.iter().map(|w| w.parse()).collect::<Result<_, _>>()?,
            dnd_weekend: self.dnd_weekend.iter().map(|w| w.parse()).collect::<Result<_, _>>()?,
            daily_limits: self.daily_limits.clone(),
            cooldown_minutes: self.cooldown_minutes.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct ConsolidationConfig {
    pub min_cluster_size: usize,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self { min_cluster_size: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct PlannerConfig {
    pub max_retries: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RewardWeightsConfig {
    pub explicit: f32,
    pub implicit: f32,
    pub self_eval: f32,
}

impl Default for RewardWeightsConfig {
    fn default() -> Self {
        Self {
            explicit: 0.4,
            implicit: 0.3,
            self_eval: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct RewardConfig {
    pub weights: RewardWeightsConfig,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            weights: RewardWeightsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct EvolutionConfig {
    pub max_step: f32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self { max_step: 0.05 }
    }
}

/// The full startup configuration document (§6). Unrecognized top-level or
/// nested keys fail `Config::load` rather than being silently ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default, rename_all = "camelCase")]
pub struct Config {
    pub cycle: CycleConfig,
    pub sense: SenseConfig,
    pub salience: SalienceConfig,
    pub thought: ThoughtConfig,
    pub express: ExpressConfig,
    pub care: CareConfig,
    pub consolidation: ConsolidationConfig,
    pub planner: PlannerConfig,
    pub reward: RewardConfig,
    pub evolution: EvolutionConfig,
    /// Reference timezone used to bound "today" for daily caps and DND
    /// day-type classification (§6: "the runtime's reference timezone is
    /// configurable"). IANA name, e.g. "America/New_York"; "UTC" if unset.
    pub timezone: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(toml::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let c = Config::default();
        assert_eq!(c.cycle.period_seconds, 10);
        assert_eq!(c.cycle.phase_budget_ms, 5000);
        assert_eq!(c.sense.top_k, 5);
        assert_eq!(c.thought.s2_max_calls_per_tick, 2);
        assert_eq!(c.express.threshold, 0.6);
        assert_eq!(c.express.quality_threshold, 0.7);
        assert_eq!(c.consolidation.min_cluster_size, 3);
        assert_eq!(c.planner.max_retries, 3);
        assert_eq!(c.evolution.max_step, 0.05);
    }

    #[test]
    fn unknown_top_level_key_fails_to_parse() {
        let toml_text = "unknown_section = true\n";
        let result: Result<Config, _> = toml::from_str(toml_text);
        assert!(result.is_err());
    }

    #[test]
    fn dnd_window_config_parses_hh_mm() {
        let window = DndWindowConfig {
            start: "23:00".into(),
            end: "06:00".into(),
        };
        let parsed = window.parse().unwrap();
        assert!(parsed.contains(NaiveTime::from_hms_opt(23, 30, 0).unwrap()));
    }
}
