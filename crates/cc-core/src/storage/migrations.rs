//! Database Migrations
//!
//! Schema migration definitions for the storage layer: one table per
//! entity in the data model, applied in order at startup.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Core entity tables: stimuli, thoughts, expression log and queue",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Reflection, consolidation, and prediction tables",
        up: MIGRATION_V2_UP,
    },
    Migration {
        version: 3,
        description: "Reward, planner, tool registry, and care policy tables",
        up: MIGRATION_V3_UP,
    },
    Migration {
        version: 4,
        description: "Filtered-stimulus log for the acted-upon invariant",
        up: MIGRATION_V4_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS stimuli (
    id TEXT PRIMARY KEY,
    stimulus_type TEXT NOT NULL,
    content TEXT NOT NULL,
    source_codelet TEXT NOT NULL,
    raw_data TEXT NOT NULL DEFAULT '{}',
    salience_score REAL NOT NULL DEFAULT 0.0,
    salience_breakdown TEXT NOT NULL DEFAULT '{}',
    acted_upon INTEGER NOT NULL DEFAULT 0,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_stimuli_acted_upon ON stimuli(acted_upon);
CREATE INDEX IF NOT EXISTS idx_stimuli_salience ON stimuli(salience_score);
CREATE INDEX IF NOT EXISTS idx_stimuli_content_hash ON stimuli(content_hash);

CREATE TABLE IF NOT EXISTS thoughts (
    id TEXT PRIMARY KEY,
    thought_type TEXT NOT NULL,
    content TEXT NOT NULL,
    stimulus_ids TEXT NOT NULL DEFAULT '[]',
    memory_context TEXT NOT NULL DEFAULT '{}',
    motivation_score REAL NOT NULL DEFAULT 0.0,
    motivation_breakdown TEXT NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'active',
    evolved_from TEXT,
    expressed_via TEXT,
    expressed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_thoughts_status ON thoughts(status);
CREATE INDEX IF NOT EXISTS idx_thoughts_motivation ON thoughts(motivation_score);

CREATE TABLE IF NOT EXISTS expression_attempts (
    id TEXT PRIMARY KEY,
    thought_id TEXT NOT NULL REFERENCES thoughts(id),
    channel TEXT NOT NULL,
    message_sent TEXT,
    success INTEGER NOT NULL,
    suppress_reason TEXT NOT NULL DEFAULT 'none',
    detected_user_state TEXT,
    motivation_score REAL NOT NULL,
    user_response TEXT NOT NULL DEFAULT 'unknown',
    effectiveness_score REAL,
    category TEXT NOT NULL DEFAULT 'other',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attempts_thought ON expression_attempts(thought_id);
CREATE INDEX IF NOT EXISTS idx_attempts_category_day ON expression_attempts(category, created_at);
CREATE INDEX IF NOT EXISTS idx_attempts_success ON expression_attempts(success);

CREATE TABLE IF NOT EXISTS queued_expressions (
    id TEXT PRIMARY KEY,
    thought_id TEXT NOT NULL REFERENCES thoughts(id),
    message TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    shown_at TEXT,
    user_response TEXT NOT NULL DEFAULT 'unknown',
    effectiveness_score REAL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queued_status ON queued_expressions(status);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS reflections (
    id TEXT PRIMARY KEY,
    reflection_type TEXT NOT NULL,
    content TEXT NOT NULL,
    trigger_summary TEXT NOT NULL,
    importance_sum REAL NOT NULL DEFAULT 0.0,
    source_thought_ids TEXT NOT NULL DEFAULT '[]',
    source_emotion_ids TEXT NOT NULL DEFAULT '[]',
    depth_level INTEGER NOT NULL DEFAULT 1,
    parent_reflection_id TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    integrated_into TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS consolidation_log (
    id TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    source_count INTEGER NOT NULL,
    topic_cluster TEXT NOT NULL,
    abstraction TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    confidence REAL NOT NULL,
    source_ids TEXT NOT NULL DEFAULT '[]',
    source_set_hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consolidation_hash ON consolidation_log(source_set_hash);

CREATE TABLE IF NOT EXISTS predictions (
    id TEXT PRIMARY KEY,
    prediction_type TEXT NOT NULL,
    prediction_text TEXT NOT NULL,
    confidence REAL NOT NULL,
    predicted_time TEXT NOT NULL,
    based_on_pattern TEXT NOT NULL,
    verified INTEGER NOT NULL DEFAULT 0,
    outcome_correct INTEGER,
    verified_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_predictions_due ON predictions(verified, predicted_time);

CREATE TABLE IF NOT EXISTS patterns (
    structural_key TEXT PRIMARY KEY,
    pattern_family TEXT NOT NULL,
    description TEXT NOT NULL,
    confidence REAL NOT NULL,
    created_at TEXT NOT NULL
);
"#;

const MIGRATION_V3_UP: &str = r#"
CREATE TABLE IF NOT EXISTS reward_signals (
    id TEXT PRIMARY KEY,
    expression_attempt_id TEXT NOT NULL REFERENCES expression_attempts(id),
    explicit_score REAL,
    implicit_score REAL,
    self_eval_score REAL,
    combined_reward REAL NOT NULL,
    explicit_source TEXT,
    implicit_classification TEXT,
    principles_evaluated TEXT NOT NULL DEFAULT '[]',
    conversation_id TEXT,
    scored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reward_attempt ON reward_signals(expression_attempt_id);

CREATE TABLE IF NOT EXISTS preference_pairs (
    id TEXT PRIMARY KEY,
    user_message TEXT NOT NULL,
    preferred_response TEXT NOT NULL,
    rejected_response TEXT NOT NULL,
    preference_strength REAL NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evolution_log (
    id TEXT PRIMARY KEY,
    knob TEXT NOT NULL,
    before_value REAL NOT NULL,
    after_value REAL NOT NULL,
    reason TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plans (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    priority INTEGER NOT NULL DEFAULT 0,
    total_steps INTEGER NOT NULL DEFAULT 0,
    completed_steps INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS plan_steps (
    id TEXT PRIMARY KEY,
    plan_id TEXT NOT NULL REFERENCES plans(id),
    step_order INTEGER NOT NULL,
    action_type TEXT NOT NULL,
    action_payload TEXT NOT NULL DEFAULT '{}',
    dependencies TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'pending',
    optional INTEGER NOT NULL DEFAULT 0,
    result_data TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    started_at TEXT,
    completed_at TEXT,
    UNIQUE(plan_id, step_order)
);

CREATE INDEX IF NOT EXISTS idx_steps_plan ON plan_steps(plan_id);
CREATE INDEX IF NOT EXISTS idx_steps_status ON plan_steps(plan_id, status);

CREATE TABLE IF NOT EXISTS tool_descriptors (
    name TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    parameters_schema TEXT NOT NULL DEFAULT '{}',
    requires_confirmation INTEGER NOT NULL DEFAULT 0,
    cost_tier INTEGER NOT NULL DEFAULT 0,
    enabled INTEGER NOT NULL DEFAULT 1,
    total_executions INTEGER NOT NULL DEFAULT 0,
    total_successes INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS care_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    energy REAL NOT NULL DEFAULT 0.5,
    stress REAL NOT NULL DEFAULT 0.5,
    sleep REAL NOT NULL DEFAULT 0.5,
    fatigue REAL NOT NULL DEFAULT 0.5,
    detection_context TEXT NOT NULL DEFAULT 'default',
    valid_from TEXT NOT NULL,
    valid_until TEXT NOT NULL
);
"#;

const MIGRATION_V4_UP: &str = r#"
CREATE TABLE IF NOT EXISTS filtered_stimuli (
    id TEXT PRIMARY KEY,
    stimulus_id TEXT NOT NULL REFERENCES stimuli(id),
    reason TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_filtered_stimulus ON filtered_stimuli(stimulus_id);
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            conn.execute_batch(migration.up)?;
            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
                rusqlite::params![migration.version],
            )?;

            applied += 1;
        }
    }

    Ok(applied)
}
