use super::classifier::IntentClassifier;
use super::types::{FeedbackType, StrategyType, UserFeedback, UserPreferences};

/// Fold one completed refinement into the session's preferences.
///
/// Conflicting tone or length signals across turns are last-writer-wins;
/// no weighting across turns is attempted.
pub fn learn_preferences(
    preferences: &mut UserPreferences,
    feedback: &UserFeedback,
    strategy: StrategyType,
    classifier: &dyn IntentClassifier,
) {
    match feedback.feedback_type {
        FeedbackType::Accept => preferences.accepted_patterns.push(strategy),
        FeedbackType::Reject => preferences.avoided_patterns.push(strategy),
        FeedbackType::Refine => {}
    }

    let intent = classifier.classify_intent(feedback.request_text());
    if let Some(tone) = intent.tone {
        preferences.preferred_tone = Some(tone);
    }
    if let Some(length) = intent.preferred_length {
        preferences.preferred_length = Some(length);
    }
    for hint in intent.structural_hints {
        if !preferences.style_preferences.contains(&hint) {
            preferences.style_preferences.push(hint);
        }
    }
}
