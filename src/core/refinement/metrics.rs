use std::time::Duration;

use super::strategy::clamp_unit;
use super::types::{
    FeedbackType, ProcessingMetrics, Rating, RefinementContext, RefinementStrategy, StrategyType,
    UserFeedback,
};

const CONFIDENCE_STEP: f64 = 0.10;

/// Record one finished refinement call.
pub fn record_refinement(
    metrics: &mut ProcessingMetrics,
    elapsed: Duration,
    strategy: StrategyType,
    confidence: f64,
) {
    metrics.processing_time = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    metrics.strategy_effectiveness.entry(strategy).or_insert(0);
    metrics.context_accuracy_score = clamp_unit(confidence);
    metrics.refinement_count += 1;
}

/// Record the user's reaction to an iteration the engine produced.
pub fn record_feedback(
    metrics: &mut ProcessingMetrics,
    feedback: &UserFeedback,
    strategy: Option<StrategyType>,
) {
    metrics.user_satisfaction_trend.push(satisfaction(feedback));

    let Some(kind) = strategy else {
        return;
    };
    let delta = match feedback.feedback_type {
        FeedbackType::Accept => 1,
        FeedbackType::Reject => -1,
        FeedbackType::Refine => 0,
    };
    *metrics.strategy_effectiveness.entry(kind).or_insert(0) += delta;
}

/// Explicit rating wins; otherwise derived from the feedback type.
pub fn satisfaction(feedback: &UserFeedback) -> f64 {
    match (feedback.rating, feedback.feedback_type) {
        (Some(Rating::Up), _) | (None, FeedbackType::Accept) => 1.0,
        (Some(Rating::Down), _) | (None, FeedbackType::Reject) => 0.0,
        (None, FeedbackType::Refine) => 0.5,
    }
}

/// Heuristic confidence that `strategy` will satisfy the user, in `[0, 1]`.
pub fn confidence_score(strategy: &RefinementStrategy, ctx: &RefinementContext) -> f64 {
    let mut confidence = strategy.success_probability;
    if ctx.iteration_count > 2 {
        confidence += CONFIDENCE_STEP;
    }
    if ctx.feedback_history.len() > 1 {
        confidence += CONFIDENCE_STEP;
    }
    if ctx.successful_patterns.len() > ctx.failure_patterns.len() {
        confidence += CONFIDENCE_STEP;
    }
    clamp_unit(confidence)
}
