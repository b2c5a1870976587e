//! Consciousness Cycle Driver (C14, §4.11)
//!
//! Runs SENSE -> PREDICT -> ACT -> LEARN every `cycle.period_seconds`, each
//! phase bounded by a soft `cycle.phase_budget_ms` budget so a slow phase
//! loses its remaining work for this tick rather than blocking the next
//! one. At most one cycle runs at a time; a tick that finds the previous
//! one still in flight is skipped and logged.

use crate::channels::ChannelRegistry;
use cc_core::prelude::*;
use cc_core::{
    mine_patterns, predict_from_pattern, score_attempt, verify_prediction, Abstractor,
    ChannelPolicy, ClusterItem, ConsolidatorConfig, ContextBundle, ExplicitSource, KnobBounds,
    NoopDeliberation, NullAbstractor, QueuedExpression, RewardWeights,
    RoutingContext as ExpressionRoutingContext, ScoringInputs, StepDispatcher, StepOutcome,
    TemplateRegistry, TemplatedAbstractor, Thought, ThoughtEngine, ThoughtEngineConfig,
    ThoughtStatus, UserStateFilter,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration as StdDuration, Instant};

/// Shared control surface the admin HTTP layer talks to: stop/reload
/// requests and a running flag, all lock-free (§6's "start/stop... and
/// reload of configuration" is the only externally initiated operation),
/// plus the set of reasons the LEARN phase is currently degraded (§4.6).
pub struct CycleHandle {
    running: AtomicBool,
    stop_requested: AtomicBool,
    reload_requested: AtomicBool,
    degraded_reasons: StdMutex<HashSet<String>>,
}

impl CycleHandle {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            reload_requested: AtomicBool::new(false),
            degraded_reasons: StdMutex::new(HashSet::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Returns false if a reload is already pending (one at a time).
    pub fn request_reload(&self) -> bool {
        self.reload_requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn take_reload_request(&self) -> bool {
        self.reload_requested.swap(false, Ordering::SeqCst)
    }

    pub fn set_degraded(&self, reason: &str) {
        self.degraded_reasons.lock().unwrap().insert(reason.to_string());
    }

    pub fn clear_degraded(&self, reason: &str) {
        self.degraded_reasons.lock().unwrap().remove(reason);
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded_reasons.lock().unwrap().is_empty()
    }

    pub fn degraded_reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self.degraded_reasons.lock().unwrap().iter().cloned().collect();
        reasons.sort();
        reasons
    }
}

impl Default for CycleHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches a Planner step to the Tool Registry by convention: a step's
/// `action_type` of `"tool"` carries the tool name and params in its
/// `action_payload`; anything else is treated as a no-op success so plans
/// mixing tool calls with bookkeeping steps still drive forward.
struct EngineStepDispatcher<'a> {
    tools: &'a StdMutex<ToolRegistry>,
}

impl StepDispatcher for EngineStepDispatcher<'_> {
    fn dispatch(&mut self, step: &cc_core::PlanStep) -> StepOutcome {
        if step.action_type != "tool" {
            return StepOutcome { success: true, result_data: None };
        }

        let Some(name) = step.action_payload.get("tool").and_then(|v| v.as_str()) else {
            return StepOutcome { success: false, result_data: None };
        };
        let params = step.action_payload.get("params").cloned().unwrap_or(serde_json::json!({}));
        let approval_token = step.action_payload.get("approvalToken").and_then(|v| v.as_str());

        let mut tools = match self.tools.lock() {
            Ok(t) => t,
            Err(_) => return StepOutcome { success: false, result_data: None },
        };

        match tools.execute(name, &params, approval_token) {
            Ok((result, _record)) => StepOutcome { success: true, result_data: Some(result) },
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "plan step tool execution failed");
                StepOutcome { success: false, result_data: None }
            }
        }
    }
}

pub struct CycleDriver {
    storage: Arc<Storage>,
    clock: Arc<dyn Clock>,
    codelets: Registry,
    goal_codelet: Arc<cc_core::GoalCodelet>,
    salience: StdMutex<SalienceScorer>,
    thoughts: ThoughtEngine,
    deliberation_configured: bool,
    router: ExpressionRouter,
    care_limits: CareLimits,
    consolidator: Consolidator,
    tools: StdMutex<ToolRegistry>,
    channels: ChannelRegistry,
    config: Config,
    express_threshold: StdMutex<f32>,
    handle: Arc<CycleHandle>,
}

impl CycleDriver {
    pub fn new(storage: Arc<Storage>, clock: Arc<dyn Clock>, config: Config, handle: Arc<CycleHandle>) -> Result<Self> {
        let goal_codelet = Arc::new(cc_core::GoalCodelet::new(chrono::Duration::days(3)));

        let mut codelets = Registry::new();
        codelets.register(Box::new(cc_core::TemporalCodelet));
        codelets.register(Box::new(cc_core::EmotionalCodelet));
        codelets.register(Box::new(cc_core::PatternCodelet));
        codelets.register(Box::new(cc_core::CalendarCodelet));
        codelets.register(Box::new(cc_core::SocialCodelet));
        codelets.register(Box::new(Arc::clone(&goal_codelet)));
        codelets.register(Box::new(cc_core::AnniversaryCodelet));

        let salience = SalienceScorer::new(config.salience.weights.clone());

        let thoughts = ThoughtEngine::new(
            TemplateRegistry::with_defaults(),
            Box::new(NoopDeliberation::unavailable()),
            ThoughtEngineConfig {
                s2_max_calls_per_tick: config.thought.s2_max_calls_per_tick,
                s2_latency: StdDuration::from_millis(config.thought.s2_latency_ms),
            },
        );
        let deliberation_configured = thoughts.deliberation_configured();

        let care_limits = config.care.to_limits().map_err(|e| StorageError::Init(e.to_string()))?;

        let router = ExpressionRouter::new(
            cc_core::SelfCritique::new(0.2, config.express.quality_threshold),
            chrono::Duration::minutes(config.express.dedup_window_min),
            care_limits.clone(),
            UserStateFilter { blocked_states: HashSet::new(), overriding_categories: HashSet::new() },
            ChannelPolicy::default(),
        );

        // When no real deliberation provider backs System 2, the Consolidator
        // must not invent templated abstractions either (§4.6) — the
        // templated fallback is only wired in once a real provider is
        // configured.
        let abstractor: Box<dyn Abstractor> = if deliberation_configured {
            Box::new(TemplatedAbstractor)
        } else {
            Box::new(NullAbstractor)
        };

        let consolidator = Consolidator::new(
            abstractor,
            ConsolidatorConfig {
                similarity_threshold: 0.3,
                min_cluster_size: config.consolidation.min_cluster_size,
                reflection_importance_threshold: 1.5,
            },
        );

        let mut tools = ToolRegistry::new();
        register_default_tools(&mut tools);

        let express_threshold = config.express.threshold;

        Ok(Self {
            storage,
            clock,
            codelets,
            goal_codelet,
            salience: StdMutex::new(salience),
            thoughts,
            deliberation_configured,
            router,
            care_limits,
            consolidator,
            tools: StdMutex::new(tools),
            channels: crate::channels::default_registry(),
            config,
            express_threshold: StdMutex::new(express_threshold),
            handle,
        })
    }

    /// Convert `now` into a `DateTime<Utc>` whose weekday/time-of-day read
    /// as the configured reference timezone's wall clock, so `CareLimits`
    /// (which only reads `weekday()`/`time()`) stays a pure function of its
    /// arguments without needing to know about timezones itself.
    fn wall_clock(&self, now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        use chrono::TimeZone;
        match self.config.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => {
                let local_naive = now.with_timezone(&tz).naive_local();
                chrono::Utc.from_utc_datetime(&local_naive)
            }
            Err(_) => now,
        }
    }

    pub async fn run_forever(self: Arc<Self>) {
        let mut interval = tokio::time::interval(StdDuration::from_secs(self.config.cycle.period_seconds.max(1)));
        loop {
            interval.tick().await;

            if self.handle.stop_requested() {
                tracing::info!("stop requested, exiting cycle driver");
                break;
            }

            if self.handle.take_reload_request() {
                tracing::info!("reload requested; configuration is re-read on next process restart in this runtime");
            }

            if self.handle.running.swap(true, Ordering::SeqCst) {
                tracing::warn!("previous cycle still in flight, skipping this tick");
                continue;
            }

            let driver = Arc::clone(&self);
            tokio::spawn(async move {
                driver.run_one_cycle().await;
                driver.handle.running.store(false, Ordering::SeqCst);
            });
        }
    }

    async fn run_one_cycle(&self) {
        let budget = StdDuration::from_millis(self.config.cycle.phase_budget_ms);

        if tokio::time::timeout(budget, self.sense()).await.is_err() {
            tracing::warn!(phase = "sense", "phase budget exceeded");
        }
        if tokio::time::timeout(budget, self.predict()).await.is_err() {
            tracing::warn!(phase = "predict", "phase budget exceeded");
        }
        if tokio::time::timeout(budget, self.act()).await.is_err() {
            tracing::warn!(phase = "act", "phase budget exceeded");
        }
        if tokio::time::timeout(budget, self.learn()).await.is_err() {
            tracing::warn!(phase = "learn", "phase budget exceeded");
        }
    }

    // ------------------------------------------------------------------
    // SENSE
    // ------------------------------------------------------------------

    async fn sense(&self) {
        let active_goals = self.goal_codelet.active_goal_names();
        let ctx = CodeletContext { clock: Arc::clone(&self.clock), active_goals: active_goals.clone() };
        let mut stimuli = self.codelets.run_all(&ctx);
        if stimuli.is_empty() {
            return;
        }

        let recent = self.storage.recent_stimuli(self.config.salience.novelty_lookback).unwrap_or_default();
        let salience = self.salience.lock().unwrap();
        for s in &mut stimuli {
            salience.score(s, &recent, &active_goals);
        }
        drop(salience);

        match self.storage.persist_sense(stimuli) {
            Ok(persisted) => tracing::debug!(count = persisted.len(), "sense phase persisted stimuli"),
            Err(err) => tracing::warn!(error = %err, "failed to persist sensed stimuli"),
        }
    }

    // ------------------------------------------------------------------
    // PREDICT
    // ------------------------------------------------------------------

    async fn predict(&self) {
        let now = self.clock.now();

        if let Ok(due) = self.storage.due_predictions(now) {
            let recent = self.storage.recent_stimuli(self.config.salience.novelty_lookback).unwrap_or_default();
            for prediction in due {
                if let Some(outcome) = verify_prediction(&prediction, &recent, chrono::Duration::minutes(15), now) {
                    if let Err(err) = self.storage.mark_prediction_verified(&prediction.id, outcome.as_bool(), now) {
                        tracing::warn!(error = %err, "failed to mark prediction verified");
                    }
                }
            }
        }

        let recent = self.storage.recent_stimuli(200).unwrap_or_default();
        let detected = mine_patterns(&recent, 0.6);
        for pattern in detected {
            if let Some(prediction) = predict_from_pattern(&pattern, now) {
                if let Err(err) = self.storage.insert_prediction(&prediction) {
                    tracing::warn!(error = %err, "failed to insert prediction");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // ACT
    // ------------------------------------------------------------------

    async fn act(&self) {
        let now = self.clock.now();
        let wall_now = self.wall_clock(now);

        let candidates = self.storage.top_k_unscored_stimuli(self.config.sense.top_k).unwrap_or_default();
        if candidates.is_empty() {
            return;
        }

        let bundle = ContextBundle::default();
        let tick_started = Instant::now();
        let mut s2_calls = 0u32;

        // Thoughts active before this tick, consulted so a freshly generated
        // thought that evolves one of them can be linked via `evolved_from`
        // (§4.3: "an evolved thought replaces its parent").
        let active_before_tick = self.storage.active_thoughts_by_motivation_desc().unwrap_or_default();
        let mut evolved_parents: HashSet<String> = HashSet::new();

        let mut categorized: Vec<(Thought, String)> = Vec::new();
        for stimulus in &candidates {
            let category = stimulus.stimulus_type.as_str().to_string();
            let generated = self.thoughts.generate(stimulus, &bundle, &mut s2_calls, tick_started);

            // Every considered stimulus either produces a Thought or is
            // explicitly logged as filtered, satisfying the acted-upon
            // invariant (§3, §8) either way.
            if generated.is_empty() {
                if let Err(err) = self.storage.insert_filtered_stimulus(&stimulus.id, "no_thought_generated") {
                    tracing::warn!(error = %err, "failed to record filtered stimulus");
                }
            }

            for mut thought in generated {
                if let Some(parent) = active_before_tick
                    .iter()
                    .find(|p| !evolved_parents.contains(&p.id) && ThoughtEngine::evolves(*p, &thought))
                {
                    thought.evolved_from = Some(parent.id.clone());
                    evolved_parents.insert(parent.id.clone());
                    if let Err(err) = self.storage.update_thought_status(&parent.id, ThoughtStatus::Evolved) {
                        tracing::warn!(error = %err, "failed to mark parent thought evolved");
                    }
                }
                categorized.push((thought, category.clone()));
            }

            if let Err(err) = self.storage.mark_stimulus_acted_upon(&stimulus.id) {
                tracing::warn!(error = %err, "failed to mark stimulus acted upon");
            }
        }

        for (thought, _) in &categorized {
            if let Err(err) = self.storage.insert_thought(thought) {
                tracing::warn!(error = %err, "failed to insert thought");
            }
        }

        categorized.sort_by(|a, b| b.0.motivation_score.partial_cmp(&a.0.motivation_score).unwrap_or(std::cmp::Ordering::Equal));

        let express_threshold = *self.express_threshold.lock().unwrap();
        let mut emitted_categories = HashSet::new();
        for (thought, category) in &categorized {
            if !thought.is_eligible_for_expression(express_threshold) {
                continue;
            }

            let attempts_today = self
                .storage
                .successful_attempts_today(category, day_start(wall_now), day_start(wall_now) + chrono::Duration::days(1))
                .unwrap_or(0);
            let last_successful_for_category = self.storage.last_successful_attempt_for_category(category).ok().flatten();
            let activity = CategoryActivity { attempts_today, last_successful_attempt: last_successful_for_category };
            let policy = CarePolicy::new(&self.care_limits);
            if !policy.allowed_now(category, &activity, wall_now) {
                self.record_suppression(thought, category, cc_core::SuppressReason::RateLimit);
                continue;
            }

            let last_for_content = self
                .storage
                .last_successful_attempt_for_content(&thought.normalized_content())
                .unwrap_or(None);

            let ctx = ExpressionRoutingContext {
                category,
                critique_inputs: cc_core::CritiqueInputs {
                    candidate_message: &thought.content,
                    has_unverified_claim: false,
                    references_memory: !thought.memory_context.is_null(),
                    style_violations: 0,
                },
                last_successful_attempt_for_content: last_for_content,
                detected_user_state: None,
                emitted_categories_this_tick: &emitted_categories,
            };

            let (decision, _critique) = self.router.decide(thought, &ctx, wall_now);

            match decision {
                cc_core::RouterDecision::Suppress { reason } => {
                    self.record_suppression(thought, category, reason);
                }
                cc_core::RouterDecision::EnqueueForUi => {
                    let queued = QueuedExpression::new(thought.id.clone(), thought.content.clone());
                    if let Err(err) = self.storage.insert_queued_expression(&queued) {
                        tracing::warn!(error = %err, "failed to queue expression for ui");
                    }
                    let attempt = cc_core::ExpressionAttempt::emitted(thought.id.clone(), "ui_queue", thought.content.clone(), thought.motivation_score, true);
                    let _ = self.storage.record_expression_decision(&attempt, category);
                    emitted_categories.insert(category.clone());
                }
                cc_core::RouterDecision::EmitToChannel { channel } => {
                    let outcome = self.channels.send(&channel, &thought.content);
                    let attempt = cc_core::ExpressionAttempt::emitted(thought.id.clone(), channel.clone(), thought.content.clone(), thought.motivation_score, outcome.delivered);
                    if let Err(err) = self.storage.record_expression_decision(&attempt, category) {
                        tracing::warn!(error = %err, "failed to record expression decision");
                    }
                    if outcome.delivered {
                        emitted_categories.insert(category.clone());
                    }
                }
            }
        }
    }

    fn record_suppression(&self, thought: &Thought, category: &str, reason: cc_core::SuppressReason) {
        let attempt = cc_core::ExpressionAttempt::suppressed(thought.id.clone(), thought.motivation_score, reason);
        if let Err(err) = self.storage.record_expression_decision(&attempt, category) {
            tracing::warn!(error = %err, "failed to record suppressed expression");
        }
    }

    // ------------------------------------------------------------------
    // LEARN
    // ------------------------------------------------------------------

    async fn learn(&self) {
        self.drive_plans();
        self.decay_idle_thoughts();
        self.consolidate();
        self.evolve();
    }

    /// Transition Active thoughts idle longer than the configured horizon to
    /// `Decayed` (§3: "decayed... idle longer than a configured horizon with
    /// no motivation lift"). `created_at` is the only timestamp a Thought
    /// carries, so it doubles as "last time this thought's motivation was
    /// set".
    fn decay_idle_thoughts(&self) {
        let Ok(active) = self.storage.active_thoughts_by_motivation_desc() else { return };
        let now = self.clock.now();
        let horizon = chrono::Duration::minutes(self.config.thought.idle_decay_minutes);

        for thought in &active {
            if now - thought.created_at > horizon {
                if let Err(err) = self.storage.update_thought_status(&thought.id, ThoughtStatus::Decayed) {
                    tracing::warn!(error = %err, "failed to decay idle thought");
                }
            }
        }
    }

    /// Drives every active plan to a fixpoint within this one cycle tick:
    /// a step that unblocks a dependent is dispatched the same tick rather
    /// than waiting for the next `cycle.period_seconds`, bounded by the
    /// plan's own step count so a cyclic dependency graph can't spin.
    fn drive_plans(&self) {
        let Ok(mut plans) = self.storage.active_plans() else { return };
        for plan in &mut plans {
            let Ok(mut steps) = self.storage.steps_for_plan(&plan.id) else { continue };
            let mut dispatcher = EngineStepDispatcher { tools: &self.tools };
            let now = self.clock.now();

            for _ in 0..steps.len().max(1) {
                let dispatched = cc_core::drive_tick(plan, &mut steps, &mut dispatcher, self.config.planner.max_retries, now);
                if dispatched.is_empty() {
                    break;
                }
                for step_order in dispatched {
                    let Some(step) = steps.iter().find(|s| s.step_order == step_order) else { continue };
                    if let Err(err) = self.storage.transition_step(plan, step) {
                        tracing::warn!(error = %err, "failed to persist plan step transition");
                    }
                }
            }
        }
    }

    fn consolidate(&self) {
        if self.deliberation_configured {
            self.handle.clear_degraded("learn_deliberation_unavailable");
        } else {
            self.handle.set_degraded("learn_deliberation_unavailable");
        }

        let recent = self.storage.recent_stimuli(self.config.salience.novelty_lookback).unwrap_or_default();
        if recent.is_empty() {
            return;
        }

        let items: Vec<ClusterItem> = recent
            .iter()
            .map(|s| ClusterItem {
                id: s.id.clone(),
                text: s.content.clone(),
                embedding: Vec::new(),
                importance: s.salience_score,
            })
            .collect();

        let run = self.consolidator.run(&items);
        for entry in &run.entries {
            match self.storage.insert_consolidation_entry_if_new(entry) {
                Ok(true) => tracing::debug!(topic = entry.topic_cluster, "new consolidation entry"),
                Ok(false) => {}
                Err(err) => tracing::warn!(error = %err, "failed to insert consolidation entry"),
            }
        }
        for reflection in &run.reflections {
            if let Err(err) = self.storage.insert_reflection(reflection) {
                tracing::warn!(error = %err, "failed to insert reflection");
            }
        }
    }

    /// Nudge `express.threshold` and the salience scorer's `emotional`
    /// weight toward more (or less) expressive behavior based on the recent
    /// reward trend (C9, §4.8). Motivation-component weights and
    /// channel-pick policy entries are the other two knob categories §4.8
    /// names; DESIGN.md records why they are out of scope for live tuning
    /// here.
    fn evolve(&self) {
        let trend = self.storage.recent_reward_trend(20).unwrap_or_default();
        let direction = cc_core::direction_from_trend(&trend, 5, 0.05);
        if direction == 0.0 {
            return;
        }

        self.tune_express_threshold(direction);
        self.tune_salience_weight(direction);
    }

    fn tune_express_threshold(&self, direction: f32) {
        let bounds = KnobBounds { min: 0.3, max: 0.9, max_step: self.config.evolution.max_step };
        let mut threshold = self.express_threshold.lock().unwrap();
        let adjustment = cc_core::adjust_knob(*threshold, -direction, bounds);
        if adjustment.changed() {
            *threshold = adjustment.after;
            drop(threshold);
            if let Err(err) = self.storage.log_evolution_change("express.threshold", adjustment.before, adjustment.after, "reward trend") {
                tracing::warn!(error = %err, "failed to log evolution change");
            }
        }
    }

    fn tune_salience_weight(&self, direction: f32) {
        let bounds = KnobBounds { min: 0.05, max: 0.5, max_step: self.config.evolution.max_step };
        let mut salience = self.salience.lock().unwrap();
        let weights = salience.weights().clone();
        let adjustment = cc_core::adjust_knob(weights.emotional, direction, bounds);
        if adjustment.changed() {
            let mut tuned = weights;
            tuned.emotional = adjustment.after;
            salience.set_weights(tuned);
            drop(salience);
            if let Err(err) = self.storage.log_evolution_change("salience.weights.emotional", adjustment.before, adjustment.after, "reward trend") {
                tracing::warn!(error = %err, "failed to log evolution change");
            }
        }
    }
}

fn day_start(wall_now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    use chrono::TimeZone;
    chrono::Utc.from_utc_datetime(&wall_now.date_naive().and_hms_opt(0, 0, 0).unwrap())
}

fn register_default_tools(registry: &mut ToolRegistry) {
    struct NoopHandler;
    impl cc_core::ToolHandler for NoopHandler {
        fn invoke(&self, _params: &serde_json::Value) -> std::result::Result<serde_json::Value, anyhow::Error> {
            Ok(serde_json::json!({ "acknowledged": true }))
        }
    }

    registry.register(cc_core::ToolDescriptor::new("acknowledge", "messaging", serde_json::json!({ "type": "object" })), Box::new(NoopHandler));
}

/// Translate an observed conversational follow-up into a RewardSignal and
/// persist it, used by channel adapters once they can observe a response
/// to a past ExpressionAttempt (§4.8). Exposed for adapters outside the
/// cycle loop; the driver itself does not call this directly since it has
/// no channel feedback to score yet.
pub fn score_and_record(storage: &Storage, expression_attempt_id: impl Into<String>, explicit: Option<ExplicitSource>, self_eval: Option<f32>, weights: RewardWeights) -> Result<()> {
    let signal = score_attempt(
        expression_attempt_id,
        ScoringInputs { explicit_source: explicit, follow_up: None, self_eval_score: self_eval, conversation_id: None },
        weights,
    );
    storage.insert_reward_signal(&signal)
}
