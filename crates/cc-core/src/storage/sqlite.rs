//! SQLite Storage Implementation
//!
//! The Store (C1): durable relational state with row-level locking via
//! transactions and (optionally) a vector similarity index over embedding
//! columns.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    CareState, ConsolidationLogEntry, ExpressionAttempt, Plan, PlanStatus, PlanStep, Prediction,
    PreferencePair, QueuedExpression, QueuedExpressionStatus, Reflection, ReflectionStatus,
    ReflectionType, RewardSignal, Stimulus, StimulusType, StepStatus, Thought, ThoughtStatus,
    ThoughtType, ToolDescriptor,
};

#[cfg(feature = "vector-search")]
use crate::search::VectorIndex;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("initialization error: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

fn poisoned(what: &str) -> StorageError {
    StorageError::Init(format!("{what} lock poisoned"))
}

// ============================================================================
// STORE
// ============================================================================

/// The durable relational store shared by every component. Methods take
/// `&self`; interior mutability comes from the writer/reader connection
/// mutexes, mirroring the teacher's `Storage` so the runtime can hold one
/// `Arc<Storage>` instead of wrapping it in an outer mutex.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    #[cfg(feature = "vector-search")]
    vector_index: Mutex<VectorIndex>,
}

impl Storage {
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "cognitive-companion", "runtime")
                    .ok_or_else(|| StorageError::Init("could not determine project directories".to_string()))?;
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("companion.db")
            }
        };

        let writer_conn = Connection::open(&path)?;

        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        #[cfg(feature = "vector-search")]
        let vector_index = VectorIndex::new()
            .map_err(|e| StorageError::Init(format!("failed to create vector index: {e}")))?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            #[cfg(feature = "vector-search")]
            vector_index: Mutex::new(vector_index),
        })
    }

    /// Create an in-memory store, used by tests and e2e journeys.
    ///
    /// A plain `Connection::open_in_memory()` gives every connection its own
    /// private database, so a writer/reader split would never see each
    /// other's rows. Both connections instead open the same shared-cache URI
    /// (unique per `Storage` so parallel tests don't collide), which keeps
    /// them pointed at one in-memory database for as long as either stays
    /// open.
    pub fn in_memory() -> Result<Self> {
        let uri = format!("file:cc-core-inmem-{}?mode=memory&cache=shared", Uuid::new_v4());
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;

        let writer_conn = Connection::open_with_flags(&uri, flags)?;
        Self::configure_connection(&writer_conn)?;
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open_with_flags(&uri, flags)?;
        Self::configure_connection(&reader_conn)?;

        #[cfg(feature = "vector-search")]
        let vector_index = VectorIndex::new()
            .map_err(|e| StorageError::Init(format!("failed to create vector index: {e}")))?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            #[cfg(feature = "vector-search")]
            vector_index: Mutex::new(vector_index),
        })
    }

    #[cfg(feature = "vector-search")]
    pub fn nearest_neighbors(&self, vector: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        let index = self.vector_index.lock().map_err(|_| poisoned("vector index"))?;
        index
            .search(vector, k)
            .map_err(|e| StorageError::Init(format!("vector search failed: {e}")))
    }

    #[cfg(feature = "vector-search")]
    pub fn index_vector(&self, key: &str, vector: &[f32]) -> Result<()> {
        let mut index = self.vector_index.lock().map_err(|_| poisoned("vector index"))?;
        index
            .add(key, vector)
            .map_err(|e| StorageError::Init(format!("vector index failed: {e}")))
    }

    // ------------------------------------------------------------------
    // Stimulus / SENSE phase
    // ------------------------------------------------------------------

    /// Persist a freshly-scored batch of stimuli inside a single
    /// transaction, deduplicating against already-pending stimuli with the
    /// same content hash (§4.1). Returns the rows actually inserted.
    pub fn persist_sense(&self, stimuli: Vec<Stimulus>) -> Result<Vec<Stimulus>> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        let tx = writer.transaction()?;
        let mut persisted = Vec::with_capacity(stimuli.len());

        for s in stimuli {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM stimuli WHERE content_hash = ?1 AND acted_upon = 0",
                    params![s.content_hash()],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                continue;
            }

            tx.execute(
                "INSERT INTO stimuli (id, stimulus_type, content, source_codelet, raw_data,
                    salience_score, salience_breakdown, acted_upon, content_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    s.id,
                    s.stimulus_type.as_str(),
                    s.content,
                    s.source_codelet,
                    s.raw_data.to_string(),
                    s.salience_score,
                    serde_json::to_string(&s.salience_breakdown)?,
                    s.acted_upon as i64,
                    s.content_hash(),
                    s.created_at.to_rfc3339(),
                ],
            )?;
            persisted.push(s);
        }

        tx.commit()?;
        Ok(persisted)
    }

    pub fn update_stimulus_salience(&self, id: &str, score: f32, breakdown: &HashMap<String, f32>) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "UPDATE stimuli SET salience_score = ?1, salience_breakdown = ?2 WHERE id = ?3",
            params![score, serde_json::to_string(breakdown)?, id],
        )?;
        Ok(())
    }

    pub fn mark_stimulus_acted_upon(&self, id: &str) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute("UPDATE stimuli SET acted_upon = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Record that a stimulus was considered and acted upon without
    /// producing a Thought, the other satisfying branch of the §3/§8
    /// invariant ("a referencing Thought or a filtered record").
    pub fn insert_filtered_stimulus(&self, stimulus_id: &str, reason: &str) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO filtered_stimuli (id, stimulus_id, reason, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![Uuid::new_v4().to_string(), stimulus_id, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn top_k_unscored_stimuli(&self, k: usize) -> Result<Vec<Stimulus>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT id, stimulus_type, content, source_codelet, raw_data, salience_score,
                    salience_breakdown, acted_upon, created_at
             FROM stimuli WHERE acted_upon = 0 ORDER BY salience_score DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![k as i64], Self::row_to_stimulus)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn recent_stimuli(&self, lookback: u32) -> Result<Vec<Stimulus>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT id, stimulus_type, content, source_codelet, raw_data, salience_score,
                    salience_breakdown, acted_upon, created_at
             FROM stimuli ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![lookback as i64], Self::row_to_stimulus)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_stimulus(row: &rusqlite::Row) -> rusqlite::Result<Stimulus> {
        let raw_data: String = row.get(4)?;
        let breakdown: String = row.get(6)?;
        let created_at: String = row.get(8)?;
        Ok(Stimulus {
            id: row.get(0)?,
            stimulus_type: StimulusType::from_str(&row.get::<_, String>(1)?),
            content: row.get(2)?,
            source_codelet: row.get(3)?,
            raw_data: serde_json::from_str(&raw_data).unwrap_or(serde_json::json!({})),
            salience_score: row.get(5)?,
            salience_breakdown: serde_json::from_str(&breakdown).unwrap_or_default(),
            acted_upon: row.get::<_, i64>(7)? != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ------------------------------------------------------------------
    // Thought / ACT phase
    // ------------------------------------------------------------------

    pub fn insert_thought(&self, thought: &Thought) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO thoughts (id, thought_type, content, stimulus_ids, memory_context,
                motivation_score, motivation_breakdown, status, evolved_from, expressed_via,
                expressed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                thought.id,
                thought.thought_type.as_str(),
                thought.content,
                serde_json::to_string(&thought.stimulus_ids)?,
                thought.memory_context.to_string(),
                thought.motivation_score,
                serde_json::to_string(&thought.motivation_breakdown)?,
                thought.status.as_str(),
                thought.evolved_from,
                thought.expressed_via,
                thought.expressed_at.map(|t| t.to_rfc3339()),
                thought.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_thought_status(&self, id: &str, status: ThoughtStatus) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "UPDATE thoughts SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(())
    }

    pub fn active_thoughts_by_motivation_desc(&self) -> Result<Vec<Thought>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT id, thought_type, content, stimulus_ids, memory_context, motivation_score,
                    motivation_breakdown, status, evolved_from, expressed_via, expressed_at, created_at
             FROM thoughts WHERE status = 'active' ORDER BY motivation_score DESC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_thought)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_thought(row: &rusqlite::Row) -> rusqlite::Result<Thought> {
        let stimulus_ids: String = row.get(3)?;
        let memory_context: String = row.get(4)?;
        let breakdown: String = row.get(6)?;
        let expressed_at: Option<String> = row.get(10)?;
        let created_at: String = row.get(11)?;
        Ok(Thought {
            id: row.get(0)?,
            thought_type: if row.get::<_, String>(1)? == "system2" {
                ThoughtType::System2
            } else {
                ThoughtType::System1
            },
            content: row.get(2)?,
            stimulus_ids: serde_json::from_str(&stimulus_ids).unwrap_or_default(),
            memory_context: serde_json::from_str(&memory_context).unwrap_or(serde_json::json!({})),
            motivation_score: row.get(5)?,
            motivation_breakdown: serde_json::from_str(&breakdown).unwrap_or_default(),
            status: ThoughtStatus::from_str(&row.get::<_, String>(7)?),
            evolved_from: row.get(8)?,
            expressed_via: row.get(9)?,
            expressed_at: expressed_at
                .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
                .map(|t| t.with_timezone(&Utc)),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    /// Atomically record an expression decision and, on success, advance the
    /// Thought to `expressed` (§4.4, §5 "ACT emission + Thought status change").
    pub fn record_expression_decision(
        &self,
        attempt: &ExpressionAttempt,
        category: &str,
    ) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        let tx = writer.transaction()?;

        tx.execute(
            "INSERT INTO expression_attempts (id, thought_id, channel, message_sent, success,
                suppress_reason, detected_user_state, motivation_score, user_response,
                effectiveness_score, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                attempt.id,
                attempt.thought_id,
                attempt.channel,
                attempt.message_sent,
                attempt.success as i64,
                attempt.suppress_reason.as_str(),
                attempt.detected_user_state,
                attempt.motivation_score,
                attempt.user_response.as_str(),
                attempt.effectiveness_score,
                category,
                attempt.created_at.to_rfc3339(),
            ],
        )?;

        if attempt.success {
            tx.execute(
                "UPDATE thoughts SET status = 'expressed', expressed_via = ?1, expressed_at = ?2 WHERE id = ?3",
                params![attempt.channel, attempt.created_at.to_rfc3339(), attempt.thought_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn last_successful_attempt_for_content(
        &self,
        normalized_content: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let at: Option<String> = reader
            .query_row(
                "SELECT ea.created_at FROM expression_attempts ea
                 JOIN thoughts t ON t.id = ea.thought_id
                 WHERE ea.success = 1 AND lower(trim(t.content)) = ?1
                 ORDER BY ea.created_at DESC LIMIT 1",
                params![normalized_content],
                |row| row.get(0),
            )
            .optional()?;
        Ok(at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)))
    }

    pub fn successful_attempts_today(&self, category: &str, day_start: DateTime<Utc>, day_end: DateTime<Utc>) -> Result<u32> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let count: i64 = reader.query_row(
            "SELECT COUNT(*) FROM expression_attempts
             WHERE category = ?1 AND success = 1 AND created_at >= ?2 AND created_at < ?3",
            params![category, day_start.to_rfc3339(), day_end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    pub fn last_successful_attempt_for_category(&self, category: &str) -> Result<Option<DateTime<Utc>>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let at: Option<String> = reader
            .query_row(
                "SELECT created_at FROM expression_attempts
                 WHERE category = ?1 AND success = 1 ORDER BY created_at DESC LIMIT 1",
                params![category],
                |row| row.get(0),
            )
            .optional()?;
        Ok(at.and_then(|s| DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&Utc)))
    }

    pub fn insert_queued_expression(&self, q: &QueuedExpression) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO queued_expressions (id, thought_id, message, status, shown_at,
                user_response, effectiveness_score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                q.id,
                q.thought_id,
                q.message,
                match q.status {
                    QueuedExpressionStatus::Pending => "pending",
                    QueuedExpressionStatus::Shown => "shown",
                    QueuedExpressionStatus::Expired => "expired",
                },
                q.shown_at.map(|t| t.to_rfc3339()),
                q.user_response.as_str(),
                q.effectiveness_score,
                q.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reflection / Consolidation (C10)
    // ------------------------------------------------------------------

    pub fn insert_reflection(&self, r: &Reflection) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO reflections (id, reflection_type, content, trigger_summary,
                importance_sum, source_thought_ids, source_emotion_ids, depth_level,
                parent_reflection_id, status, integrated_into, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                r.id,
                reflection_type_str(r.reflection_type),
                r.content,
                r.trigger_summary,
                r.importance_sum,
                serde_json::to_string(&r.source_thought_ids)?,
                serde_json::to_string(&r.source_emotion_ids)?,
                r.depth_level,
                r.parent_reflection_id,
                reflection_status_str(r.status),
                r.integrated_into,
                r.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Insert a ConsolidationLogEntry unless one already exists for the same
    /// source-set hash, enforcing the §4.6 idempotence invariant. Returns
    /// whether a new row was inserted.
    pub fn insert_consolidation_entry_if_new(&self, entry: &ConsolidationLogEntry) -> Result<bool> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        let existing: Option<String> = writer
            .query_row(
                "SELECT id FROM consolidation_log WHERE source_set_hash = ?1",
                params![entry.source_set_hash],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Ok(false);
        }

        writer.execute(
            "INSERT INTO consolidation_log (id, source_type, source_count, topic_cluster,
                abstraction, target_type, target_id, confidence, source_ids, source_set_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id,
                entry.source_type,
                entry.source_count,
                entry.topic_cluster,
                entry.abstraction,
                entry.target_type,
                entry.target_id,
                entry.confidence,
                serde_json::to_string(&entry.source_ids)?,
                entry.source_set_hash,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(true)
    }

    pub fn consolidation_entry_count(&self) -> Result<u64> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let count: i64 = reader.query_row("SELECT COUNT(*) FROM consolidation_log", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ------------------------------------------------------------------
    // Prediction (C11)
    // ------------------------------------------------------------------

    pub fn insert_prediction(&self, p: &Prediction) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO predictions (id, prediction_type, prediction_text, confidence,
                predicted_time, based_on_pattern, verified, outcome_correct, verified_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                p.id,
                p.prediction_type,
                p.prediction_text,
                p.confidence,
                p.predicted_time.to_rfc3339(),
                p.based_on_pattern,
                p.verified as i64,
                p.outcome_correct,
                p.verified_at.map(|t| t.to_rfc3339()),
                p.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn due_predictions(&self, now: DateTime<Utc>) -> Result<Vec<Prediction>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT id, prediction_type, prediction_text, confidence, predicted_time,
                    based_on_pattern, verified, outcome_correct, verified_at, created_at
             FROM predictions WHERE verified = 0 AND predicted_time <= ?1",
        )?;
        let rows = stmt
            .query_map(params![now.to_rfc3339()], Self::row_to_prediction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn mark_prediction_verified(&self, id: &str, outcome_correct: bool, at: DateTime<Utc>) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "UPDATE predictions SET verified = 1, outcome_correct = ?1, verified_at = ?2 WHERE id = ?3",
            params![outcome_correct as i64, at.to_rfc3339(), id],
        )?;
        Ok(())
    }

    fn row_to_prediction(row: &rusqlite::Row) -> rusqlite::Result<Prediction> {
        let predicted_time: String = row.get(4)?;
        let verified_at: Option<String> = row.get(8)?;
        let created_at: String = row.get(9)?;
        Ok(Prediction {
            id: row.get(0)?,
            prediction_type: row.get(1)?,
            prediction_text: row.get(2)?,
            confidence: row.get(3)?,
            predicted_time: DateTime::parse_from_rfc3339(&predicted_time)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            based_on_pattern: row.get(5)?,
            verified: row.get::<_, i64>(6)? != 0,
            outcome_correct: row.get::<_, Option<i64>>(7)?.map(|v| v != 0),
            verified_at: verified_at
                .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
                .map(|t| t.with_timezone(&Utc)),
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    // ------------------------------------------------------------------
    // Reward / Evolution (C8, C9)
    // ------------------------------------------------------------------

    pub fn insert_reward_signal(&self, r: &RewardSignal) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO reward_signals (id, expression_attempt_id, explicit_score, implicit_score,
                self_eval_score, combined_reward, explicit_source, implicit_classification,
                principles_evaluated, conversation_id, scored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                r.id,
                r.expression_attempt_id,
                r.explicit_score,
                r.implicit_score,
                r.self_eval_score,
                r.combined_reward,
                r.explicit_source,
                r.implicit_classification,
                serde_json::to_string(&r.principles_evaluated)?,
                r.conversation_id,
                r.scored_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn insert_preference_pair(&self, p: &PreferencePair) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO preference_pairs (id, user_message, preferred_response, rejected_response,
                preference_strength, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                p.id,
                p.user_message,
                p.preferred_response,
                p.rejected_response,
                p.preference_strength,
                p.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn recent_reward_trend(&self, limit: u32) -> Result<Vec<f32>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT combined_reward FROM reward_signals ORDER BY scored_at DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| row.get::<_, f32>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Append a before/after row to the evolution audit log (§2 supplement).
    pub fn log_evolution_change(&self, knob: &str, before: f32, after: f32, reason: &str) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO evolution_log (id, knob, before_value, after_value, reason, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![Uuid::new_v4().to_string(), knob, before, after, reason, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Planner (C12)
    // ------------------------------------------------------------------

    pub fn insert_plan(&self, plan: &Plan, steps: &[PlanStep]) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        let tx = writer.transaction()?;

        tx.execute(
            "INSERT INTO plans (id, name, status, priority, total_steps, completed_steps, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                plan.id,
                plan.name,
                plan_status_str(plan.status),
                plan.priority,
                plan.total_steps,
                plan.completed_steps,
                plan.created_at.to_rfc3339(),
            ],
        )?;

        for step in steps {
            tx.execute(
                "INSERT INTO plan_steps (id, plan_id, step_order, action_type, action_payload,
                    dependencies, status, optional, result_data, retry_count, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    step.id,
                    step.plan_id,
                    step.step_order,
                    step.action_type,
                    step.action_payload.to_string(),
                    serde_json::to_string(&step.dependencies.iter().collect::<Vec<_>>())?,
                    step_status_str(step.status),
                    step.optional as i64,
                    step.result_data.as_ref().map(|v| v.to_string()),
                    step.retry_count,
                    step.started_at.map(|t| t.to_rfc3339()),
                    step.completed_at.map(|t| t.to_rfc3339()),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn active_plans(&self) -> Result<Vec<Plan>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT id, name, status, priority, total_steps, completed_steps, created_at
             FROM plans WHERE status IN ('pending', 'active') ORDER BY priority DESC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_plan)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn steps_for_plan(&self, plan_id: &str) -> Result<Vec<PlanStep>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        let mut stmt = reader.prepare(
            "SELECT id, plan_id, step_order, action_type, action_payload, dependencies, status,
                    optional, result_data, retry_count, started_at, completed_at
             FROM plan_steps WHERE plan_id = ?1 ORDER BY step_order ASC",
        )?;
        let rows = stmt
            .query_map(params![plan_id], Self::row_to_step)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Transition a step and reconcile the owning Plan's status inside one
    /// transaction (§5 "planner step transitions").
    pub fn transition_step(&self, plan: &Plan, step: &PlanStep) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        let tx = writer.transaction()?;

        tx.execute(
            "UPDATE plan_steps SET status = ?1, result_data = ?2, retry_count = ?3,
                started_at = ?4, completed_at = ?5 WHERE id = ?6",
            params![
                step_status_str(step.status),
                step.result_data.as_ref().map(|v| v.to_string()),
                step.retry_count,
                step.started_at.map(|t| t.to_rfc3339()),
                step.completed_at.map(|t| t.to_rfc3339()),
                step.id,
            ],
        )?;

        tx.execute(
            "UPDATE plans SET status = ?1, completed_steps = ?2, total_steps = ?3 WHERE id = ?4",
            params![plan_status_str(plan.status), plan.completed_steps, plan.total_steps, plan.id],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn row_to_plan(row: &rusqlite::Row) -> rusqlite::Result<Plan> {
        let created_at: String = row.get(6)?;
        Ok(Plan {
            id: row.get(0)?,
            name: row.get(1)?,
            status: plan_status_from_str(&row.get::<_, String>(2)?),
            priority: row.get(3)?,
            total_steps: row.get(4)?,
            completed_steps: row.get(5)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn row_to_step(row: &rusqlite::Row) -> rusqlite::Result<PlanStep> {
        let action_payload: String = row.get(4)?;
        let dependencies: String = row.get(5)?;
        let result_data: Option<String> = row.get(8)?;
        let started_at: Option<String> = row.get(10)?;
        let completed_at: Option<String> = row.get(11)?;
        let deps: Vec<u32> = serde_json::from_str(&dependencies).unwrap_or_default();
        Ok(PlanStep {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            step_order: row.get(2)?,
            action_type: row.get(3)?,
            action_payload: serde_json::from_str(&action_payload).unwrap_or(serde_json::json!({})),
            dependencies: deps.into_iter().collect::<HashSet<u32>>(),
            status: step_status_from_str(&row.get::<_, String>(6)?),
            optional: row.get::<_, i64>(7)? != 0,
            result_data: result_data.and_then(|s| serde_json::from_str(&s).ok()),
            retry_count: row.get(9)?,
            started_at: started_at.and_then(|t| DateTime::parse_from_rfc3339(&t).ok()).map(|t| t.with_timezone(&Utc)),
            completed_at: completed_at.and_then(|t| DateTime::parse_from_rfc3339(&t).ok()).map(|t| t.with_timezone(&Utc)),
        })
    }

    // ------------------------------------------------------------------
    // Tool Registry (C13)
    // ------------------------------------------------------------------

    pub fn upsert_tool_descriptor(&self, tool: &ToolDescriptor) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO tool_descriptors (name, category, parameters_schema, requires_confirmation,
                cost_tier, enabled, total_executions, total_successes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(name) DO UPDATE SET
                category = excluded.category,
                parameters_schema = excluded.parameters_schema,
                requires_confirmation = excluded.requires_confirmation,
                cost_tier = excluded.cost_tier,
                enabled = excluded.enabled",
            params![
                tool.name,
                tool.category,
                tool.parameters_schema.to_string(),
                tool.requires_confirmation as i64,
                tool.cost_tier,
                tool.enabled as i64,
                tool.total_executions,
                tool.total_successes,
            ],
        )?;
        Ok(())
    }

    pub fn record_tool_execution(&self, name: &str, succeeded: bool) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "UPDATE tool_descriptors SET total_executions = total_executions + 1,
                total_successes = total_successes + ?1 WHERE name = ?2",
            params![succeeded as i64, name],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Care policy (C15)
    // ------------------------------------------------------------------

    pub fn upsert_care_state(&self, state: &CareState) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| poisoned("writer"))?;
        writer.execute(
            "INSERT INTO care_state (id, energy, stress, sleep, fatigue, detection_context, valid_from, valid_until)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET energy=excluded.energy, stress=excluded.stress,
                sleep=excluded.sleep, fatigue=excluded.fatigue, detection_context=excluded.detection_context,
                valid_from=excluded.valid_from, valid_until=excluded.valid_until",
            params![
                state.energy,
                state.stress,
                state.sleep,
                state.fatigue,
                state.detection_context,
                state.valid_from.to_rfc3339(),
                state.valid_until.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn current_care_state(&self) -> Result<Option<CareState>> {
        let reader = self.reader.lock().map_err(|_| poisoned("reader"))?;
        reader
            .query_row(
                "SELECT energy, stress, sleep, fatigue, detection_context, valid_from, valid_until
                 FROM care_state WHERE id = 1",
                [],
                |row| {
                    let valid_from: String = row.get(5)?;
                    let valid_until: String = row.get(6)?;
                    Ok(CareState {
                        energy: row.get(0)?,
                        stress: row.get(1)?,
                        sleep: row.get(2)?,
                        fatigue: row.get(3)?,
                        detection_context: row.get(4)?,
                        valid_from: DateTime::parse_from_rfc3339(&valid_from)
                            .map(|d| d.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                        valid_until: DateTime::parse_from_rfc3339(&valid_until)
                            .map(|d| d.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now()),
                    })
                },
            )
            .optional()
            .map_err(StorageError::from)
    }
}

fn reflection_type_str(t: ReflectionType) -> &'static str {
    match t {
        ReflectionType::Insight => "insight",
        ReflectionType::Question => "question",
        ReflectionType::Realization => "realization",
        ReflectionType::Growth => "growth",
    }
}

fn reflection_status_str(s: ReflectionStatus) -> &'static str {
    match s {
        ReflectionStatus::Active => "active",
        ReflectionStatus::Integrated => "integrated",
        ReflectionStatus::Superseded => "superseded",
    }
}

fn plan_status_str(s: PlanStatus) -> &'static str {
    match s {
        PlanStatus::Pending => "pending",
        PlanStatus::Active => "active",
        PlanStatus::Paused => "paused",
        PlanStatus::Completed => "completed",
        PlanStatus::Failed => "failed",
    }
}

fn plan_status_from_str(s: &str) -> PlanStatus {
    match s {
        "active" => PlanStatus::Active,
        "paused" => PlanStatus::Paused,
        "completed" => PlanStatus::Completed,
        "failed" => PlanStatus::Failed,
        _ => PlanStatus::Pending,
    }
}

fn step_status_str(s: StepStatus) -> &'static str {
    match s {
        StepStatus::Pending => "pending",
        StepStatus::Running => "running",
        StepStatus::Completed => "completed",
        StepStatus::Failed => "failed",
        StepStatus::Skipped => "skipped",
    }
}

fn step_status_from_str(s: &str) -> StepStatus {
    match s {
        "running" => StepStatus::Running,
        "completed" => StepStatus::Completed,
        "failed" => StepStatus::Failed,
        "skipped" => StepStatus::Skipped,
        _ => StepStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StimulusType;

    fn test_storage() -> Storage {
        Storage::in_memory().unwrap()
    }

    #[test]
    fn persist_sense_deduplicates_by_content_hash() {
        let storage = test_storage();
        let a = Stimulus::new(StimulusType::Temporal, "drink water", "hydration", serde_json::json!({}));
        let b = Stimulus::new(StimulusType::Temporal, "drink water", "hydration", serde_json::json!({}));

        let first = storage.persist_sense(vec![a]).unwrap();
        assert_eq!(first.len(), 1);

        let second = storage.persist_sense(vec![b]).unwrap();
        assert_eq!(second.len(), 0, "duplicate pending stimulus should be deduplicated");
    }

    #[test]
    fn top_k_unscored_orders_by_salience_desc() {
        let storage = test_storage();
        let mut low = Stimulus::new(StimulusType::Goal, "a", "c", serde_json::json!({}));
        low.salience_score = 0.2;
        let mut high = Stimulus::new(StimulusType::Goal, "b", "c", serde_json::json!({}));
        high.salience_score = 0.9;
        storage.persist_sense(vec![low, high]).unwrap();

        let top = storage.top_k_unscored_stimuli(5).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top[0].salience_score >= top[1].salience_score);
    }

    #[test]
    fn record_expression_decision_advances_thought_on_success() {
        let storage = test_storage();
        let thought = Thought::new(ThoughtType::System1, "hi", vec![], Default::default());
        storage.insert_thought(&thought).unwrap();

        let attempt = ExpressionAttempt::emitted(&thought.id, "messenger", "hi", 0.8, true);
        storage.record_expression_decision(&attempt, "other").unwrap();

        let active = storage.active_thoughts_by_motivation_desc().unwrap();
        assert!(active.is_empty(), "expressed thought should no longer be active");
    }

    #[test]
    fn consolidation_entry_is_idempotent_by_source_hash() {
        let storage = test_storage();
        let ids = vec!["a".to_string(), "b".to_string()];
        let entry = ConsolidationLogEntry {
            id: Uuid::new_v4().to_string(),
            source_type: "conversation".into(),
            source_count: 2,
            topic_cluster: "hydration".into(),
            abstraction: "likes staying hydrated".into(),
            target_type: "knowledge_node".into(),
            target_id: Uuid::new_v4().to_string(),
            confidence: 0.8,
            source_ids: ids.clone(),
            source_set_hash: ConsolidationLogEntry::hash_source_ids(&ids),
            created_at: Utc::now(),
        };

        assert!(storage.insert_consolidation_entry_if_new(&entry).unwrap());
        assert!(!storage.insert_consolidation_entry_if_new(&entry).unwrap());
        assert_eq!(storage.consolidation_entry_count().unwrap(), 1);
    }

    #[test]
    fn plan_transition_persists_step_and_plan_state_together() {
        let storage = test_storage();
        let mut plan = Plan::new("hydration plan", 0, 1);
        let mut step = PlanStep::new(&plan.id, 1, "noop", serde_json::json!({}), Default::default());
        storage.insert_plan(&plan, &[step.clone()]).unwrap();

        step.status = StepStatus::Completed;
        plan.reconcile(&[step.clone()]);
        storage.transition_step(&plan, &step).unwrap();

        let steps = storage.steps_for_plan(&plan.id).unwrap();
        assert_eq!(steps[0].status, StepStatus::Completed);
    }
}
