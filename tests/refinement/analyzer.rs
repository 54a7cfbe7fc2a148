use std::sync::Arc;

use draftsmith::RefinementEngine;
use draftsmith::config::RefinementConfig;
use draftsmith::core::refinement::{
    ContentIteration, Intent, IntentClassifier, LengthPreference, Tone, UserFeedback,
};

use super::scripted_generator::ScriptedGenerator;

fn engine() -> RefinementEngine {
    RefinementEngine::new(
        Arc::new(ScriptedGenerator::new("Revised draft.")),
        RefinementConfig::default(),
    )
    .unwrap()
}

fn record_with_feedback(engine: &RefinementEngine, session_id: &str, feedback: UserFeedback) {
    let iteration = ContentIteration::new(1, "prompt", "Draft body");
    let id = iteration.iteration_id.clone();
    engine.record_iteration(session_id, iteration);
    engine.attach_feedback(session_id, &id, feedback).unwrap();
}

#[test]
fn unknown_session_asks_for_more_feedback() {
    let analysis = engine().analyze_feedback_patterns("never-opened");
    assert!(analysis.dominant_feedback_types.is_empty());
    assert_eq!(analysis.improvement_suggestions.len(), 1);
    assert!(analysis.improvement_suggestions[0].contains("gather more"));
}

#[test]
fn session_feedback_drives_dominant_types_and_signals() {
    let engine = engine();
    record_with_feedback(
        &engine,
        "s-1",
        UserFeedback::reject().with_quick_feedback(["wordy"]),
    );
    record_with_feedback(
        &engine,
        "s-1",
        UserFeedback::refine("make it casual and shorter").with_quick_feedback(["wordy"]),
    );
    record_with_feedback(&engine, "s-1", UserFeedback::reject());

    let analysis = engine.analyze_feedback_patterns("s-1");

    assert_eq!(
        analysis.dominant_feedback_types,
        vec!["reject", "wordy", "refine"]
    );
    assert_eq!(analysis.preference_signals.preferred_tone, Some(Tone::Casual));
    assert_eq!(
        analysis.preference_signals.preferred_length,
        Some(LengthPreference::Short)
    );
    let suggestions = analysis.improvement_suggestions.join("\n");
    assert!(suggestions.contains("alternative generation approaches"));
    assert!(suggestions.contains("casual"));
}

#[test]
fn analysis_is_idempotent_and_session_scoped() {
    let engine = engine();
    record_with_feedback(&engine, "s-1", UserFeedback::accept());
    record_with_feedback(&engine, "s-2", UserFeedback::reject());

    let first = engine.analyze_feedback_patterns("s-1");
    let second = engine.analyze_feedback_patterns("s-1");
    assert_eq!(first, second);
    assert_eq!(first.dominant_feedback_types, vec!["accept"]);
    assert_eq!(
        engine.analyze_feedback_patterns("s-2").dominant_feedback_types,
        vec!["reject"]
    );
}

/// Reads every request as a plea for a friendly tone.
struct AlwaysFriendly;

impl IntentClassifier for AlwaysFriendly {
    fn classify_intent(&self, _text: &str) -> Intent {
        Intent {
            tone: Some(Tone::Friendly),
            tone_requested: true,
            ..Intent::default()
        }
    }

    fn name(&self) -> &str {
        "always_friendly"
    }
}

#[test]
fn custom_classifier_feeds_preference_signals() {
    let engine = engine().with_classifier(Arc::new(AlwaysFriendly));
    record_with_feedback(&engine, "s-1", UserFeedback::refine("whatever"));

    let analysis = engine.analyze_feedback_patterns("s-1");
    assert_eq!(analysis.preference_signals.preferred_tone, Some(Tone::Friendly));
}
