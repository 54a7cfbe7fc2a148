//! Derives a [`RefinementContext`] from a request and the session's
//! preferences. Pure; never fails.

use std::collections::BTreeSet;

use super::types::{ContentIteration, RefinementContext, RefinementRequest, UserPreferences};

/// Tokens must be longer than this many characters to count as a pattern.
const MIN_PATTERN_CHARS: usize = 4;
/// Patterns kept per accepted iteration.
const PATTERNS_PER_ITERATION: usize = 5;

pub fn build_context(
    request: &RefinementRequest,
    preferences: &UserPreferences,
) -> RefinementContext {
    let iterations = &request.previous_iterations;

    let original_content = iterations
        .iter()
        .find(|it| it.iteration_id == request.iteration_id)
        .map(|it| it.generated_content.clone())
        .unwrap_or_default();

    let feedback_history = iterations
        .iter()
        .filter_map(|it| it.user_feedback.clone())
        .collect();

    RefinementContext {
        original_content,
        feedback_history,
        iteration_count: iterations.len(),
        successful_patterns: extract_successful_patterns(iterations),
        failure_patterns: extract_failure_patterns(iterations),
        user_preferences: preferences.clone(),
    }
}

/// First few long tokens from every accepted or up-rated iteration.
pub fn extract_successful_patterns(iterations: &[ContentIteration]) -> BTreeSet<String> {
    iterations
        .iter()
        .filter(|it| it.user_feedback.as_ref().is_some_and(|f| f.is_positive()))
        .flat_map(|it| {
            it.generated_content
                .split_whitespace()
                .filter(|token| token.chars().count() > MIN_PATTERN_CHARS)
                .take(PATTERNS_PER_ITERATION)
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Requests and quick tags from every rejected or down-rated iteration.
pub fn extract_failure_patterns(iterations: &[ContentIteration]) -> Vec<String> {
    let mut patterns = Vec::new();
    for feedback in iterations
        .iter()
        .filter_map(|it| it.user_feedback.as_ref())
        .filter(|f| f.is_negative())
    {
        if let Some(request) = &feedback.refinement_request {
            patterns.push(request.clone());
        }
        patterns.extend(feedback.quick_feedback.iter().cloned());
    }
    patterns
}
