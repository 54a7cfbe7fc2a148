//! Session-wide feedback analysis, independent of any single refinement.

use std::collections::BTreeMap;

use super::classifier::IntentClassifier;
use super::types::{FeedbackAnalysis, FeedbackType, LengthPreference, UserFeedback, UserPreferences};

const DOMINANT_LIMIT: usize = 3;

pub fn analyze_feedback(
    history: &[UserFeedback],
    classifier: &dyn IntentClassifier,
) -> FeedbackAnalysis {
    let dominant_feedback_types = dominant_labels(history);
    let preference_signals = preference_signals(history, classifier);
    let improvement_suggestions =
        suggestions(history.is_empty(), &dominant_feedback_types, &preference_signals);

    FeedbackAnalysis {
        dominant_feedback_types,
        preference_signals,
        improvement_suggestions,
    }
}

/// Feedback types and quick tags share one frequency table.
fn dominant_labels(history: &[UserFeedback]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for feedback in history {
        *counts.entry(feedback.feedback_type.to_string()).or_insert(0) += 1;
        for tag in &feedback.quick_feedback {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // stable: equal counts stay alphabetical
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(DOMINANT_LIMIT)
        .map(|(label, _)| label)
        .collect()
}

fn preference_signals(
    history: &[UserFeedback],
    classifier: &dyn IntentClassifier,
) -> UserPreferences {
    let combined = history
        .iter()
        .filter_map(|f| f.refinement_request.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let intent = classifier.classify_intent(&combined);
    UserPreferences {
        preferred_tone: intent.tone,
        preferred_length: intent.preferred_length,
        ..UserPreferences::default()
    }
}

fn suggestions(no_feedback: bool, dominant: &[String], signals: &UserPreferences) -> Vec<String> {
    if no_feedback {
        return vec![
            "Not enough feedback yet; gather more responses before adjusting defaults.".to_string(),
        ];
    }

    let has = |kind: FeedbackType| dominant.iter().any(|label| *label == kind.to_string());
    let mut out = Vec::new();

    if has(FeedbackType::Reject) {
        out.push(
            "Several drafts were rejected; try alternative generation approaches such as a different angle or structure."
                .to_string(),
        );
    }
    if has(FeedbackType::Refine) {
        out.push(
            "Most feedback asks for refinements; apply narrower, targeted changes per iteration."
                .to_string(),
        );
    }
    if has(FeedbackType::Accept) {
        out.push(
            "Accepted drafts make a good baseline; reuse their structure for similar requests."
                .to_string(),
        );
    }
    if let Some(tone) = signals.preferred_tone {
        out.push(format!("Default to a {tone} tone for this user."));
    }
    match signals.preferred_length {
        Some(LengthPreference::Short) => {
            out.push("Keep first drafts shorter than the usual default.".to_string());
        }
        Some(LengthPreference::Long) => {
            out.push("First drafts can be longer and more detailed.".to_string());
        }
        None => {}
    }
    out
}
