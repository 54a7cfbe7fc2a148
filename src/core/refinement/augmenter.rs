use super::types::{
    LengthPreference, RefinementContext, RefinementRequest, RefinementStrategy, StrategyType,
};

/// Build the directive handed to the generation backend.
///
/// Section order is fixed: base directive, preference constraint, strategy
/// modifications, patterns to keep, patterns to avoid. Nothing is truncated.
pub fn build_directive(
    request: &RefinementRequest,
    ctx: &RefinementContext,
    strategy: &RefinementStrategy,
) -> String {
    let mut sections = vec![base_directive(request, ctx)];

    if let Some(constraint) = preference_constraint(ctx, strategy) {
        sections.push(constraint);
    }

    sections.extend(strategy.prompt_modifications.iter().cloned());

    if let Some(hint) = retain_hint(ctx) {
        sections.push(hint);
    }
    if let Some(hint) = avoid_hint(ctx) {
        sections.push(hint);
    }

    sections.join("\n\n")
}

pub(crate) fn base_directive(request: &RefinementRequest, ctx: &RefinementContext) -> String {
    let mut directive = format!(
        "Refine the following {} content based on the user's feedback.\n\nOriginal content:\n{}\n\nFeedback: {}",
        request.content_type,
        ctx.original_content,
        request.feedback.request_text(),
    );
    if !request.brief.is_empty() {
        directive.push_str("\n\nOriginal brief: ");
        directive.push_str(&request.brief);
    }
    directive.push_str("\n\nProduce an improved version that addresses the feedback.");
    directive
}

fn preference_constraint(ctx: &RefinementContext, strategy: &RefinementStrategy) -> Option<String> {
    let prefs = &ctx.user_preferences;
    match strategy.strategy_type {
        StrategyType::ToneAdjustment => prefs
            .preferred_tone
            .map(|tone| format!("Use a {tone} tone throughout.")),
        StrategyType::LengthModification => prefs.preferred_length.map(|length| match length {
            LengthPreference::Short => "Keep the result short and to the point.".to_string(),
            LengthPreference::Long => "Make the result long and detailed.".to_string(),
        }),
        _ => None,
    }
}

pub(crate) fn retain_hint(ctx: &RefinementContext) -> Option<String> {
    if ctx.successful_patterns.is_empty() {
        return None;
    }
    let joined = ctx
        .successful_patterns
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        "Retain these elements that worked well previously: {joined}."
    ))
}

pub(crate) fn avoid_hint(ctx: &RefinementContext) -> Option<String> {
    if ctx.failure_patterns.is_empty() {
        return None;
    }
    Some(format!(
        "Avoid these elements that the user disliked: {}.",
        ctx.failure_patterns.join(", ")
    ))
}
