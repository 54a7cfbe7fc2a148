use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::future::join_all;

use super::analyzer::analyze_feedback;
use super::augmenter::build_directive;
use super::classifier::{IntentClassifier, KeywordClassifier};
use super::context::build_context;
use super::learner::learn_preferences;
use super::metrics::{confidence_score, record_feedback, record_refinement};
use super::strategy::{
    ScoredStrategy, StrategyCatalog, fallback_strategy, select_alternatives, select_strategy,
};
use super::types::{
    ContentIteration, ContextSource, FeedbackAnalysis, ProcessingMetrics, RefinementContext,
    RefinementRequest, RefinementResult, RefinementStrategy, UserFeedback, UserPreferences,
};
use crate::config::{Config, RefinementConfig};
use crate::core::sessions::{SessionHandle, SessionRegistry, SessionState};
use crate::error::{ConfigError, RefinementError, Result, SessionError};
use crate::observability::{NoopObserver, Observer, ObserverEvent, ObserverMetric, create_observer};
use crate::providers::ContentGenerator;

/// Per-call inputs derived before the generator is awaited.
struct Plan {
    ctx: RefinementContext,
    ranked: Vec<ScoredStrategy>,
    attempt_number: u32,
}

/// Decides how to regenerate a draft from user feedback and drives the
/// generation backend.
///
/// All per-session state lives in the engine's [`SessionRegistry`]. Session
/// locks are only taken between awaits.
pub struct RefinementEngine {
    config: RefinementConfig,
    generator: Arc<dyn ContentGenerator>,
    classifier: Arc<dyn IntentClassifier>,
    catalog: StrategyCatalog,
    sessions: SessionRegistry,
    observer: Arc<dyn Observer>,
}

impl RefinementEngine {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        config: RefinementConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let catalog = StrategyCatalog::with_overrides(&config.strategy_overrides()?);
        Ok(Self {
            config,
            generator,
            classifier: Arc::new(KeywordClassifier),
            catalog,
            sessions: SessionRegistry::new(),
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StrategyCatalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Choose the best strategy for the feedback, regenerate once and fold
    /// the outcome into the session.
    pub async fn process_refinement(&self, request: &RefinementRequest) -> Result<RefinementResult> {
        let started = Instant::now();
        let session = self.sessions.open(&request.session_id);
        self.observer.record_event(&ObserverEvent::RefinementStart {
            session_id: request.session_id.clone(),
            content_type: request.content_type.to_string(),
        });

        let plan = self.plan(&session, request);
        let strategy = select_strategy(&plan.ranked);
        tracing::debug!(
            session_id = %request.session_id,
            strategy = %strategy.strategy_type,
            candidates = plan.ranked.len(),
            "strategy selected"
        );

        let result = match self.generate_variation(request, &plan, strategy, 0).await {
            Ok(result) => result,
            Err(err) => {
                self.observer.record_event(&ObserverEvent::Error {
                    component: "refinement".into(),
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        self.commit(&session, request, std::slice::from_ref(&result), started);
        Ok(result)
    }

    /// Generate up to `count` variations with distinct strategies, concurrently.
    ///
    /// `count` is capped by `max_alternatives`. A failing variation is logged
    /// and skipped; the batch itself only fails for reasons unrelated to the
    /// backend. Results are ordered by strategy rank.
    pub async fn process_refinement_alternatives(
        &self,
        request: &RefinementRequest,
        count: usize,
    ) -> Result<Vec<RefinementResult>> {
        let count = count.min(self.config.max_alternatives);
        if count == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let session = self.sessions.open(&request.session_id);
        self.observer.record_event(&ObserverEvent::RefinementStart {
            session_id: request.session_id.clone(),
            content_type: request.content_type.to_string(),
        });

        let plan = self.plan(&session, request);
        let mut picks: Vec<RefinementStrategy> = select_alternatives(&plan.ranked, count)
            .into_iter()
            .map(|scored| scored.strategy)
            .collect();
        if picks.is_empty() {
            picks.push(fallback_strategy());
        }

        let outcomes = join_all(
            picks
                .iter()
                .enumerate()
                .map(|(rank, strategy)| self.generate_variation(request, &plan, strategy.clone(), rank)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for (strategy, outcome) in picks.iter().zip(outcomes) {
            match outcome {
                Ok(result) => results.push(result),
                Err(err) => {
                    tracing::warn!(
                        session_id = %request.session_id,
                        strategy = %strategy.strategy_type,
                        error = %err,
                        "alternative generation failed, skipping"
                    );
                    self.observer.record_event(&ObserverEvent::AlternativeFailed {
                        session_id: request.session_id.clone(),
                        strategy: strategy.strategy_type.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if !results.is_empty() {
            self.commit(&session, request, &results, started);
        }
        Ok(results)
    }

    /// Dominant feedback, preference signals and suggestions over every
    /// feedback recorded in the session. Unknown sessions analyze as empty.
    pub fn analyze_feedback_patterns(&self, session_id: &str) -> FeedbackAnalysis {
        let history = self
            .sessions
            .get(session_id)
            .map(|session| session.lock().feedback_history())
            .unwrap_or_default();
        analyze_feedback(&history, self.classifier.as_ref())
    }

    pub fn processing_metrics(&self, session_id: &str) -> Option<ProcessingMetrics> {
        self.sessions
            .get(session_id)
            .map(|session| session.lock().metrics.clone())
    }

    pub fn preferences(&self, session_id: &str) -> Option<UserPreferences> {
        self.sessions
            .get(session_id)
            .map(|session| session.lock().preferences.clone())
    }

    /// Record an iteration produced outside the engine, e.g. the first draft.
    pub fn record_iteration(&self, session_id: &str, iteration: ContentIteration) {
        self.sessions
            .open(session_id)
            .with_state(|state| state.record_iteration(iteration, None));
    }

    pub fn attach_feedback(
        &self,
        session_id: &str,
        iteration_id: &str,
        feedback: UserFeedback,
    ) -> Result<()> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        let feedback_type = feedback.feedback_type;
        session.with_state(|state| apply_feedback(state, iteration_id, feedback))?;

        self.observer.record_event(&ObserverEvent::FeedbackAttached {
            session_id: session_id.to_string(),
            feedback_type: feedback_type.to_string(),
        });
        Ok(())
    }

    /// Drop all state for the session. Returns `false` if it was not open.
    pub fn close_session(&self, session_id: &str) -> bool {
        let closed = self.sessions.close(session_id);
        if closed {
            self.observer.record_event(&ObserverEvent::SessionClosed {
                session_id: session_id.to_string(),
            });
            self.observer
                .record_metric(&ObserverMetric::ActiveSessions(active_sessions(&self.sessions)));
        }
        closed
    }

    fn plan(&self, session: &SessionHandle, request: &RefinementRequest) -> Plan {
        let preferences = session.with_state(|state| {
            absorb_history(state, request);
            state.preferences.clone()
        });

        let ctx = build_context(request, &preferences);
        let request_text = request.normalized_request();
        let intent = self.classifier.classify_intent(&request_text);
        let ranked = self.catalog.rank(&intent, &ctx, &request_text);
        let attempt_number = request
            .previous_iterations
            .iter()
            .map(|it| it.attempt_number)
            .max()
            .unwrap_or(0)
            .saturating_add(1);

        Plan {
            ctx,
            ranked,
            attempt_number,
        }
    }

    async fn generate_variation(
        &self,
        request: &RefinementRequest,
        plan: &Plan,
        strategy: RefinementStrategy,
        rank: usize,
    ) -> Result<RefinementResult> {
        let directive = build_directive(request, &plan.ctx, &strategy);
        let options = self.config.options_for(request.content_type, rank);
        let request_time = Utc::now();

        let generated = self
            .generator
            .generate(request.content_type, &directive, options)
            .await
            .map_err(RefinementError::Generation)?;

        if generated.text.trim().is_empty() {
            return Err(RefinementError::EmptyGeneration {
                content_type: request.content_type.to_string(),
            });
        }

        if let Some(tokens) = generated.metadata.total_tokens()
            && tokens > 0
        {
            self.observer
                .record_metric(&ObserverMetric::TokensUsed(tokens));
        }

        let mut iteration = ContentIteration::new(plan.attempt_number, directive, generated.text);
        iteration.request_time = request_time;
        iteration.correlation_id = generated.metadata.correlation_id;

        let confidence = confidence_score(&strategy, &plan.ctx);
        Ok(RefinementResult {
            iteration,
            improvement_hypothesis: improvement_hypothesis(&strategy, request, &plan.ctx),
            context_used: context_used(&plan.ctx),
            confidence_score: confidence,
            strategy,
        })
    }

    /// Fold finished results into the session. `results[0]` is the best.
    fn commit(
        &self,
        session: &SessionHandle,
        request: &RefinementRequest,
        results: &[RefinementResult],
        started: Instant,
    ) {
        let Some(best) = results.first() else {
            return;
        };
        let elapsed = started.elapsed();

        session.with_state(|state| {
            learn_preferences(
                &mut state.preferences,
                &request.feedback,
                best.strategy.strategy_type,
                self.classifier.as_ref(),
            );
            for result in results {
                state.record_iteration(result.iteration.clone(), Some(result.strategy.strategy_type));
                state
                    .metrics
                    .strategy_effectiveness
                    .entry(result.strategy.strategy_type)
                    .or_insert(0);
            }
            record_refinement(
                &mut state.metrics,
                elapsed,
                best.strategy.strategy_type,
                best.confidence_score,
            );
        });

        tracing::info!(
            session_id = %request.session_id,
            strategy = %best.strategy.strategy_type,
            variations = results.len(),
            duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            confidence = best.confidence_score,
            "refinement complete"
        );
        self.observer.record_event(&ObserverEvent::RefinementEnd {
            session_id: request.session_id.clone(),
            strategy: best.strategy.strategy_type.to_string(),
            duration: elapsed,
            confidence: best.confidence_score,
        });
        self.observer
            .record_metric(&ObserverMetric::RefinementLatency(elapsed));
        self.observer
            .record_metric(&ObserverMetric::Confidence(best.confidence_score));
        self.observer
            .record_metric(&ObserverMetric::ActiveSessions(active_sessions(&self.sessions)));
    }
}

/// Build an engine, observer included, from a loaded [`Config`].
pub fn create_refinement_engine(
    config: &Config,
    generator: Arc<dyn ContentGenerator>,
) -> std::result::Result<RefinementEngine, ConfigError> {
    Ok(RefinementEngine::new(generator, config.refinement.clone())?
        .with_observer(create_observer(&config.observability)))
}

fn active_sessions(sessions: &SessionRegistry) -> u64 {
    u64::try_from(sessions.len()).unwrap_or(u64::MAX)
}

/// Attach feedback and update the satisfaction trend.
///
/// Refused for unknown iterations and for iterations that already carry
/// feedback; metrics are only touched once the attachment is allowed.
fn apply_feedback(
    state: &mut SessionState,
    iteration_id: &str,
    feedback: UserFeedback,
) -> std::result::Result<(), SessionError> {
    state.ensure_feedback_slot(iteration_id)?;
    let strategy = state.strategy_for(iteration_id);
    record_feedback(&mut state.metrics, &feedback, strategy);
    state.attach_feedback(iteration_id, feedback)
}

/// Make the session aware of the caller's history and the triggering feedback.
///
/// Unknown iterations are recorded as caller-produced. Feedback follows the
/// same attach-once rule as [`RefinementEngine::attach_feedback`], so
/// resending a history is a no-op and missing ids are tolerated.
fn absorb_history(state: &mut SessionState, request: &RefinementRequest) {
    for iteration in &request.previous_iterations {
        let known = state
            .iterations
            .iter()
            .any(|it| it.iteration_id == iteration.iteration_id);
        let mut recorded = iteration.clone();
        let feedback = recorded.user_feedback.take();
        if !known {
            state.record_iteration(recorded, None);
        }
        if let Some(feedback) = feedback {
            skip_refused(apply_feedback(state, &iteration.iteration_id, feedback));
        }
    }

    skip_refused(apply_feedback(
        state,
        &request.iteration_id,
        request.feedback.clone(),
    ));
}

fn skip_refused(outcome: std::result::Result<(), SessionError>) {
    if let Err(err) = outcome {
        tracing::trace!(%err, "history feedback skipped");
    }
}

fn context_used(ctx: &RefinementContext) -> Vec<ContextSource> {
    let mut used = Vec::with_capacity(5);
    if !ctx.original_content.is_empty() {
        used.push(ContextSource::OriginalContent);
    }
    if !ctx.feedback_history.is_empty() {
        used.push(ContextSource::FeedbackHistory);
    }
    if !ctx.successful_patterns.is_empty() {
        used.push(ContextSource::SuccessfulPatterns);
    }
    if !ctx.failure_patterns.is_empty() {
        used.push(ContextSource::FailurePatterns);
    }
    if ctx.user_preferences != UserPreferences::default() {
        used.push(ContextSource::UserPreferences);
    }
    used
}

fn improvement_hypothesis(
    strategy: &RefinementStrategy,
    request: &RefinementRequest,
    ctx: &RefinementContext,
) -> String {
    let feedback = match request.feedback.request_text().trim() {
        "" => format!("the {} feedback", request.feedback.feedback_type),
        text => format!("\"{text}\""),
    };
    format!(
        "{} should address {feedback}, retaining {} successful pattern(s) and avoiding {} failure pattern(s).",
        strategy.description,
        ctx.successful_patterns.len(),
        ctx.failure_patterns.len(),
    )
}
