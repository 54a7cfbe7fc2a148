use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use draftsmith::config::{Config, RefinementConfig};
use draftsmith::core::refinement::{
    ContentIteration, ContentType, ContextSource, LengthPreference, RefinementRequest,
    StrategyType, Tone, UserFeedback,
};
use draftsmith::observability::{Observer, ObserverEvent, ObserverMetric};
use draftsmith::providers::{Provider, ProviderGenerator, ProviderResponse};
use draftsmith::{RefinementEngine, RefinementError, SessionError, create_refinement_engine};

use super::scripted_generator::ScriptedGenerator;

const TONE_MARKER: &str = "Adjust the tone to match the requested voice";

fn engine_with(generator: Arc<ScriptedGenerator>) -> RefinementEngine {
    RefinementEngine::new(generator, RefinementConfig::default()).unwrap()
}

fn first_draft(engine: &RefinementEngine, session_id: &str) -> ContentIteration {
    let draft = ContentIteration::new(
        1,
        "Announce the spring sale",
        "Hey folks!!! Our spring sale is here, grab everything now!!!",
    );
    engine.record_iteration(session_id, draft.clone());
    draft
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &ObserverEvent) {
        let label = match event {
            ObserverEvent::RefinementStart { .. } => "start",
            ObserverEvent::RefinementEnd { .. } => "end",
            ObserverEvent::AlternativeFailed { .. } => "alternative_failed",
            ObserverEvent::FeedbackAttached { .. } => "feedback",
            ObserverEvent::SessionClosed { .. } => "closed",
            ObserverEvent::Error { .. } => "error",
        };
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label.to_string());
    }

    fn record_metric(&self, _metric: &ObserverMetric) {}

    fn name(&self) -> &str {
        "recording"
    }
}

#[tokio::test]
async fn multi_turn_session_learns_preferences() {
    let generator = Arc::new(ScriptedGenerator::new("unused").with_replies(&[
        "Dear customers, our spring sale has begun.",
        "Our spring sale has begun.",
    ]));
    let engine = engine_with(generator.clone());
    let draft = first_draft(&engine, "s-1");

    let turn_one = RefinementRequest::new(
        "s-1",
        draft.iteration_id.clone(),
        ContentType::Email,
        UserFeedback::refine("Use a professional tone"),
    )
    .with_history(vec![draft.clone()]);
    let first = engine.process_refinement(&turn_one).await.unwrap();
    assert_eq!(first.strategy.strategy_type, StrategyType::ToneAdjustment);

    let turn_two = RefinementRequest::new(
        "s-1",
        first.iteration.iteration_id.clone(),
        ContentType::Email,
        UserFeedback::refine("Good, now make it shorter"),
    )
    .with_history(vec![
        draft.with_feedback(UserFeedback::refine("Use a professional tone")),
        first.iteration.clone(),
    ]);
    let second = engine.process_refinement(&turn_two).await.unwrap();

    assert_eq!(second.strategy.strategy_type, StrategyType::LengthModification);
    assert_eq!(second.iteration.attempt_number, 3);
    assert_eq!(second.iteration.generated_content, "Our spring sale has begun.");
    assert!(second.context_used.contains(&ContextSource::UserPreferences));

    let prefs = engine.preferences("s-1").unwrap();
    assert_eq!(prefs.preferred_tone, Some(Tone::Professional));
    assert_eq!(prefs.preferred_length, Some(LengthPreference::Short));

    let metrics = engine.processing_metrics("s-1").unwrap();
    assert_eq!(metrics.refinement_count, 2);
    assert_eq!(metrics.user_satisfaction_trend, vec![0.5, 0.5]);

    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.content_type == ContentType::Email));
    assert_eq!(calls[1].options.max_length, 800);
    assert!(calls[1].directive.contains("Condense the content to its essential points."));
    assert!(!calls[1].directive.contains("Keep the result short"));
}

#[tokio::test]
async fn outright_rejection_falls_back_to_style_and_remembers_it() {
    let engine = engine_with(Arc::new(ScriptedGenerator::new("A calmer take on the sale.")));
    let draft = first_draft(&engine, "s-1");
    let request = RefinementRequest::new(
        "s-1",
        draft.iteration_id.clone(),
        ContentType::Social,
        UserFeedback::reject(),
    )
    .with_history(vec![draft]);

    let result = engine.process_refinement(&request).await.unwrap();

    assert_eq!(result.strategy.strategy_type, StrategyType::StyleRefinement);
    assert!(result.improvement_hypothesis.contains("reject"));
    assert!(result.iteration.prompt.contains("Hey folks!!!"));
    let prefs = engine.preferences("s-1").unwrap();
    assert_eq!(prefs.avoided_patterns, vec![StrategyType::StyleRefinement]);
    assert_eq!(
        engine.processing_metrics("s-1").unwrap().user_satisfaction_trend,
        vec![0.0]
    );
}

#[tokio::test]
async fn generator_error_propagates_unchanged() {
    let generator = Arc::new(ScriptedGenerator::new("never").failing_when(TONE_MARKER));
    let engine = engine_with(generator);
    let request = RefinementRequest::new(
        "s-1",
        "unknown",
        ContentType::Blog,
        UserFeedback::refine("friendlier tone please"),
    );

    let err = engine.process_refinement(&request).await.unwrap_err();
    assert!(matches!(err, RefinementError::Generation(_)));
    assert!(err.to_string().contains("backend refused"));
    assert_eq!(engine.processing_metrics("s-1").unwrap().refinement_count, 0);
}

#[tokio::test]
async fn failing_alternative_does_not_abort_the_batch() {
    let generator = Arc::new(ScriptedGenerator::new("Variant.").failing_when(TONE_MARKER));
    let observer = Arc::new(RecordingObserver::default());
    let engine = engine_with(generator.clone()).with_observer(observer.clone());
    let request = RefinementRequest::new(
        "s-1",
        "unknown",
        ContentType::Blog,
        UserFeedback::refine("more formal and shorter"),
    );

    let results = engine
        .process_refinement_alternatives(&request, 3)
        .await
        .unwrap();

    assert_eq!(generator.calls().len(), 3);
    assert_eq!(results.len(), 2);
    assert!(
        results
            .iter()
            .all(|r| r.strategy.strategy_type != StrategyType::ToneAdjustment)
    );
    assert!(results.iter().all(|r| !r.iteration.generated_content.is_empty()));
    assert_eq!(
        observer.events(),
        vec!["start", "alternative_failed", "end"]
    );
}

#[tokio::test]
async fn batch_where_everything_fails_is_empty_not_an_error() {
    let generator = Arc::new(ScriptedGenerator::new("Variant.").failing_when("Refine the following"));
    let engine = engine_with(generator);
    let request = RefinementRequest::new("s-1", "unknown", ContentType::Social, UserFeedback::reject());

    let results = engine
        .process_refinement_alternatives(&request, 2)
        .await
        .unwrap();

    assert!(results.is_empty());
    let metrics = engine.processing_metrics("s-1").unwrap();
    assert_eq!(metrics.refinement_count, 0);
    assert!(metrics.strategy_effectiveness.is_empty());
}

#[tokio::test]
async fn confidence_grows_with_history_but_stays_bounded() {
    let engine = engine_with(Arc::new(ScriptedGenerator::new("Tightened copy.")));
    let history = vec![
        ContentIteration::new(1, "p", "Exceptional product announcement")
            .with_feedback(UserFeedback::accept()),
        ContentIteration::new(2, "p", "Another draft").with_feedback(UserFeedback::refine("ok")),
        ContentIteration::new(3, "p", "Third draft"),
    ];
    let target = history[2].iteration_id.clone();
    let request = RefinementRequest::new("s-1", target, ContentType::Blog, UserFeedback::refine("polish"))
        .with_history(history);

    let result = engine.process_refinement(&request).await.unwrap();

    assert_eq!(result.strategy.strategy_type, StrategyType::StyleRefinement);
    assert!((result.confidence_score - 1.0).abs() < 1e-9);
    assert!(result.context_used.contains(&ContextSource::SuccessfulPatterns));
    assert!(result.iteration.prompt.contains("exceptional"));
}

#[tokio::test]
async fn sessions_are_independent_and_closable() {
    let engine = engine_with(Arc::new(ScriptedGenerator::new("Done.")));
    let formal = RefinementRequest::new("a", "x", ContentType::Blog, UserFeedback::refine("formal"));
    let casual = RefinementRequest::new("b", "y", ContentType::Blog, UserFeedback::refine("casual"));

    engine.process_refinement(&formal).await.unwrap();
    engine.process_refinement(&casual).await.unwrap();

    assert_eq!(engine.preferences("a").unwrap().preferred_tone, Some(Tone::Formal));
    assert_eq!(engine.preferences("b").unwrap().preferred_tone, Some(Tone::Casual));
    assert_eq!(engine.sessions().len(), 2);

    assert!(engine.close_session("a"));
    assert!(engine.processing_metrics("a").is_none());
    assert!(engine.processing_metrics("b").is_some());
}

#[tokio::test]
async fn refinement_feedback_round_trip_updates_effectiveness() {
    let engine = engine_with(Arc::new(ScriptedGenerator::new("Formal version.")));
    let request = RefinementRequest::new("s-1", "x", ContentType::Email, UserFeedback::refine("formal"));
    let result = engine.process_refinement(&request).await.unwrap();

    engine
        .attach_feedback("s-1", &result.iteration.iteration_id, UserFeedback::reject())
        .unwrap();

    let metrics = engine.processing_metrics("s-1").unwrap();
    assert_eq!(
        metrics.strategy_effectiveness.get(&StrategyType::ToneAdjustment),
        Some(&-1)
    );
    assert!((engine.catalog().success_probability(StrategyType::ToneAdjustment) - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn feedback_is_final_once_attached() {
    let engine = engine_with(Arc::new(ScriptedGenerator::new("Polished launch post.")));
    let request = RefinementRequest::new("s-1", "x", ContentType::Blog, UserFeedback::refine("polish it"));
    let result = engine.process_refinement(&request).await.unwrap();
    let strategy = result.strategy.strategy_type;
    let id = result.iteration.iteration_id.clone();

    engine
        .attach_feedback("s-1", &id, UserFeedback::accept())
        .unwrap();
    for _ in 0..2 {
        let err = engine
            .attach_feedback("s-1", &id, UserFeedback::accept())
            .unwrap_err();
        assert!(matches!(
            err,
            RefinementError::Session(SessionError::FeedbackAlreadyAttached { .. })
        ));
    }

    let metrics = engine.processing_metrics("s-1").unwrap();
    assert_eq!(metrics.strategy_effectiveness.get(&strategy), Some(&1));
    assert_eq!(metrics.user_satisfaction_trend, vec![1.0]);

    // A later request carrying different feedback for the same iteration
    // goes through history sync, which follows the same rule.
    let rejected = UserFeedback::reject().with_quick_feedback(["bland"]);
    let follow_up = RefinementRequest::new("s-1", id, ContentType::Blog, rejected.clone())
        .with_history(vec![result.iteration.with_feedback(rejected)]);
    engine.process_refinement(&follow_up).await.unwrap();

    let metrics = engine.processing_metrics("s-1").unwrap();
    assert_eq!(metrics.strategy_effectiveness.get(&strategy), Some(&1));
    assert_eq!(metrics.user_satisfaction_trend, vec![1.0]);
}

#[tokio::test]
async fn only_tagged_rejections_feed_the_avoid_list() {
    let generator = Arc::new(
        ScriptedGenerator::new("unused").with_replies(&["A calmer take.", "A quieter take."]),
    );
    let engine = engine_with(generator.clone());
    let draft = first_draft(&engine, "s-1");

    let bare = RefinementRequest::new(
        "s-1",
        draft.iteration_id.clone(),
        ContentType::Social,
        UserFeedback::reject(),
    )
    .with_history(vec![draft.clone().with_feedback(UserFeedback::reject())]);
    let first = engine.process_refinement(&bare).await.unwrap();

    let disliked = UserFeedback::reject().with_quick_feedback(["exclamation marks", "urgency"]);
    let tagged = RefinementRequest::new(
        "s-1",
        first.iteration.iteration_id.clone(),
        ContentType::Social,
        disliked.clone(),
    )
    .with_history(vec![
        draft.with_feedback(UserFeedback::reject()),
        first.iteration.with_feedback(disliked),
    ]);
    engine.process_refinement(&tagged).await.unwrap();

    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].directive.contains("Avoid these elements"));
    assert!(calls[1].directive.contains(
        "Avoid these elements that the user disliked: exclamation marks, urgency."
    ));
    assert_eq!(
        engine.processing_metrics("s-1").unwrap().user_satisfaction_trend,
        vec![0.0, 0.0]
    );
}

struct CannedProvider;

#[async_trait]
impl Provider for CannedProvider {
    async fn chat_with_system(
        &self,
        _system_prompt: Option<&str>,
        _message: &str,
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<String> {
        Ok(String::new())
    }

    async fn chat_with_system_full(
        &self,
        _system_prompt: Option<&str>,
        _message: &str,
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<ProviderResponse> {
        Ok(ProviderResponse::with_usage("Provider-written draft.".into(), 40, 12)
            .with_request_id("req-42"))
    }

    fn name(&self) -> &str {
        "canned"
    }
}

#[tokio::test]
async fn engine_built_from_config_runs_over_a_provider() {
    let mut config = Config::default();
    config.observability.backend = "log".into();
    config.refinement.temperature = 0.2;

    let generator = Arc::new(ProviderGenerator::new(Arc::new(CannedProvider), "writer-1"));
    let engine = create_refinement_engine(&config, generator).unwrap();
    let request = RefinementRequest::new("s-1", "x", ContentType::Blog, UserFeedback::refine("expand"));

    let result = engine.process_refinement(&request).await.unwrap();

    assert_eq!(result.iteration.generated_content, "Provider-written draft.");
    assert_eq!(result.iteration.correlation_id.as_deref(), Some("req-42"));
    assert!((engine.config().temperature - 0.2).abs() < f64::EPSILON);
}
