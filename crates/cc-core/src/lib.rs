//! # Cognitive Companion Runtime Core
//!
//! The always-on cognitive loop's library crate: a SQLite-backed domain
//! model plus the pure/near-pure logic for every phase of one
//! SENSE -> PREDICT -> ACT -> LEARN cycle.
//!
//! - **Storage (C1)**: a writer/reader SQLite connection pair behind a
//!   versioned migration sequence, the store of record for every entity.
//! - **Codelets (C3)**: independent perception sources run each SENSE phase.
//! - **Salience Scorer (C4)**: scores stimuli along five weighted
//!   dimensions, degrading gracefully to lexical overlap without embeddings.
//! - **Thought Engine (C5)**: System-1 templates plus a budget-bounded
//!   System-2 deliberation contract.
//! - **Motivation & Expression Router (C6)** and its **Self-Critique Check
//!   (C7)**: the five-step decision procedure from quality gate to channel
//!   pick.
//! - **Consolidator (C10)**: topic clustering and abstraction into semantic
//!   knowledge and Reflections.
//! - **Pattern & Prediction Engine (C11)**: five pattern families and a
//!   verification sweep over due Predictions.
//! - **Reward Aggregator & Evolution (C8, C9)**: combined-reward scoring
//!   and bounded knob tuning.
//! - **Planner / Step Executor (C12)** and **Tool Registry (C13)**: a DAG
//!   driver dispatching to tools or the router.
//! - **Health & Care Policy (C15)**: DND, daily caps, cooldowns, and
//!   wellbeing, all pure functions of the Store and the clock.
//!
//! The Consciousness Cycle Driver (C14) that wires these together into a
//! running process lives in the `cc-runtime` binary crate, not here.
//!
//! ## Feature Flags
//!
//! - `embeddings` (default): local embedding generation via fastembed,
//!   used by the salience scorer's novelty dimension and the Consolidator's
//!   clustering step.
//! - `vector-search` (default): HNSW recall over embedding vectors via
//!   USearch, used for novelty scoring and related-memory retrieval.
//! - `bundled-sqlite` (default): statically link SQLite via rusqlite's
//!   `bundled` feature.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod care;
pub mod clock;
pub mod codelets;
pub mod config;
pub mod consolidation;
pub mod domain;
pub mod expression;
pub mod pattern;
pub mod planner;
pub mod reward;
pub mod salience;
pub mod storage;
pub mod thought;
pub mod tools;

#[cfg(feature = "embeddings")]
#[cfg_attr(docsrs, doc(cfg(feature = "embeddings")))]
pub mod embeddings;

#[cfg(feature = "vector-search")]
#[cfg_attr(docsrs, doc(cfg(feature = "vector-search")))]
pub mod search;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use care::{CarePolicy, CategoryActivity};
pub use clock::{Clock, SystemClock, TestClock};
pub use codelets::{
    AnniversaryCodelet, CalendarCodelet, Codelet, CodeletContext, CodeletError, EmotionalCodelet,
    GoalCodelet, PatternCodelet, Registry, SocialCodelet, TemporalCodelet,
};
pub use config::{Config, ConfigError};
pub use consolidation::{AbstractionOutput, Abstractor, ClusterItem, ConsolidationRun, Consolidator, ConsolidatorConfig, NullAbstractor, TemplatedAbstractor};
pub use domain::{
    CareLimits, CarePreference, CareState, ConsolidationLogEntry, DndWindow, ExpressionAttempt,
    MotivationBreakdown, Plan, PlanStatus, PlanStep, PreferencePair, Prediction, QueuedExpression,
    QueuedExpressionStatus, Reflection, ReflectionStatus, ReflectionType, RewardSignal, RewardWeights,
    Stimulus, StimulusType, StepStatus, SuppressReason, Thought, ThoughtStatus, ThoughtType,
    ToolDescriptor, UserResponse,
};
pub use expression::{ChannelPolicy, CritiqueInputs, CritiqueResult, ExpressionRouter, PrincipleScores, RouterDecision, RoutingContext, SelfCritique, UserStateFilter};
pub use pattern::{mine_patterns, predict_from_pattern, verify_prediction, DetectedPattern, PatternFamily, VerificationOutcome};
pub use planner::{drive_tick, ready_steps, StepDispatcher, StepOutcome};
pub use reward::{adjust_knob, direction_from_trend, score_attempt, ExplicitSource, FollowUpBehavior, KnobAdjustment, KnobBounds, ScoringInputs};
pub use salience::SalienceScorer;
pub use storage::{Result, Storage, StorageError};
pub use thought::{ContextBundle, Deliberate, DeliberationError, DeliberationRequest, DeliberationResponse, NoopDeliberation, TemplateMatch, TemplateRegistry, ThoughtCandidate, ThoughtEngine, ThoughtEngineConfig};
pub use tools::{validate_against_schema, ExecutionRecord, ToolError, ToolHandler, ToolRegistry};

#[cfg(feature = "embeddings")]
pub use embeddings::{cosine_similarity, euclidean_distance, Embedding, EmbeddingError, EmbeddingService, EMBEDDING_DIMENSIONS};

#[cfg(feature = "vector-search")]
pub use search::{VectorIndex, VectorIndexConfig, VectorIndexStats, VectorSearchError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage from `cc-runtime` and integration
/// tests.
pub mod prelude {
    pub use crate::{
        CarePolicy, Clock, Codelet, CodeletContext, Config, Consolidator, ExpressionRouter,
        PatternFamily, Registry, Result, SalienceScorer, Storage, StorageError, SystemClock,
        ThoughtEngine, ToolRegistry,
    };

    #[cfg(feature = "embeddings")]
    pub use crate::{Embedding, EmbeddingService};

    #[cfg(feature = "vector-search")]
    pub use crate::VectorIndex;
}
