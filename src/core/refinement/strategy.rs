//! Strategy catalog, gating, scoring and ranking.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::classifier::{Intent, LENGTH_KEYWORDS, STRUCTURE_KEYWORDS, TONE_KEYWORDS, contains_any};
use super::types::{LengthDirection, RefinementContext, RefinementStrategy, StrategyType};

const KEYWORD_BOOST: f64 = 0.2;
const SUCCESS_PATTERN_BOOST: f64 = 0.15;
const FAILURE_PATTERN_PENALTY: f64 = 0.10;

const FALLBACK_CONTEXT_WEIGHT: f64 = 0.5;
const FALLBACK_SUCCESS_PROBABILITY: f64 = 0.6;

impl StrategyType {
    /// Enumeration order; ties in ranking keep this order.
    pub const ALL: [Self; 8] = [
        Self::ToneAdjustment,
        Self::LengthModification,
        Self::StructureReorganization,
        Self::ContentExpansion,
        Self::ContentCondensation,
        Self::StyleRefinement,
        Self::TopicRefocus,
        Self::FormatChange,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::ToneAdjustment => "Adjust tone and voice to match the requested register",
            Self::LengthModification => "Change the overall length of the content",
            Self::StructureReorganization => "Reorganize structure and flow",
            Self::ContentExpansion => "Develop key ideas in more depth",
            Self::ContentCondensation => "Condense the content to its essentials",
            Self::StyleRefinement => "Refine style, clarity and word choice",
            Self::TopicRefocus => "Refocus the content on its central topic",
            Self::FormatChange => "Change the presentation format",
        }
    }

    pub fn context_weight(self) -> f64 {
        match self {
            Self::ToneAdjustment => 0.9,
            Self::LengthModification => 0.85,
            Self::StructureReorganization => 0.8,
            Self::StyleRefinement => 0.7,
            Self::ContentExpansion
            | Self::ContentCondensation
            | Self::TopicRefocus
            | Self::FormatChange => 0.6,
        }
    }

    pub fn default_success_probability(self) -> f64 {
        match self {
            Self::StyleRefinement => 0.80,
            Self::ToneAdjustment => 0.75,
            Self::StructureReorganization => 0.70,
            Self::LengthModification => 0.65,
            Self::ContentExpansion
            | Self::ContentCondensation
            | Self::TopicRefocus
            | Self::FormatChange => 0.60,
        }
    }

    /// Keywords that switch this strategy on. Empty for ungated strategies.
    pub fn gate_keywords(self) -> &'static [&'static str] {
        match self {
            Self::ToneAdjustment => TONE_KEYWORDS,
            Self::LengthModification => LENGTH_KEYWORDS,
            Self::StructureReorganization => STRUCTURE_KEYWORDS,
            _ => &[],
        }
    }

    pub fn prompt_modifications(self, direction: Option<LengthDirection>) -> Vec<String> {
        let lines: &[&str] = match self {
            Self::ToneAdjustment => &[
                "Adjust the tone to match the requested voice while keeping the core message intact.",
                "Keep word choice consistent with the target tone throughout.",
            ],
            Self::LengthModification => match direction.unwrap_or(LengthDirection::Condense) {
                LengthDirection::Expand => &[
                    "Expand the content with supporting details and concrete examples.",
                    "Make sure every added sentence stays relevant to the original message.",
                ],
                LengthDirection::Condense => &[
                    "Condense the content to its essential points.",
                    "Remove redundant phrases and filler words.",
                ],
            },
            Self::StructureReorganization => &[
                "Reorganize the content so ideas flow logically from one to the next.",
                "Use clear sections or paragraph breaks where they help readability.",
            ],
            Self::ContentExpansion => &["Develop the key ideas in more depth."],
            Self::ContentCondensation => &["Cut the content down to the most important information."],
            Self::StyleRefinement => &[
                "Polish word choice and sentence rhythm for clarity.",
                "Preserve the original meaning and intent.",
            ],
            Self::TopicRefocus => &["Refocus the content on the central topic and drop tangents."],
            Self::FormatChange => &["Change the format to better suit the content type."],
        };
        lines.iter().map(|line| (*line).to_string()).collect()
    }
}

/// A candidate with its score for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredStrategy {
    pub strategy: RefinementStrategy,
    pub score: f64,
}

/// Holds the success-probability table and turns intents into candidates.
///
/// The table starts from per-type defaults (optionally overridden by config)
/// and only changes through [`StrategyCatalog::set_success_probability`].
pub struct StrategyCatalog {
    success_rates: RwLock<BTreeMap<StrategyType, f64>>,
}

impl StrategyCatalog {
    pub fn new() -> Self {
        let rates = StrategyType::ALL
            .into_iter()
            .map(|kind| (kind, kind.default_success_probability()))
            .collect();
        Self {
            success_rates: RwLock::new(rates),
        }
    }

    pub fn with_overrides(overrides: &BTreeMap<StrategyType, f64>) -> Self {
        let catalog = Self::new();
        for (kind, probability) in overrides {
            catalog.set_success_probability(*kind, *probability);
        }
        catalog
    }

    pub fn success_probability(&self, kind: StrategyType) -> f64 {
        self.success_rates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_success_probability())
    }

    /// Overwrite the running estimate for one strategy, clamped to `[0, 1]`.
    pub fn set_success_probability(&self, kind: StrategyType, probability: f64) {
        self.success_rates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, clamp_unit(probability));
    }

    pub fn strategy(
        &self,
        kind: StrategyType,
        direction: Option<LengthDirection>,
    ) -> RefinementStrategy {
        let length_direction = match kind {
            StrategyType::LengthModification => Some(direction.unwrap_or(LengthDirection::Condense)),
            _ => None,
        };
        RefinementStrategy {
            strategy_type: kind,
            description: kind.description().to_string(),
            prompt_modifications: kind.prompt_modifications(length_direction),
            context_weight: kind.context_weight(),
            success_probability: self.success_probability(kind),
            length_direction,
        }
    }

    /// Gated candidates in enumeration order. Style refinement is always present.
    pub fn candidates(&self, intent: &Intent) -> Vec<RefinementStrategy> {
        let mut candidates = Vec::with_capacity(4);
        if intent.tone_requested {
            candidates.push(self.strategy(StrategyType::ToneAdjustment, None));
        }
        if let Some(direction) = intent.length_direction {
            candidates.push(self.strategy(StrategyType::LengthModification, Some(direction)));
        }
        if !intent.structural_hints.is_empty() {
            candidates.push(self.strategy(StrategyType::StructureReorganization, None));
        }
        candidates.push(self.strategy(StrategyType::StyleRefinement, None));
        candidates
    }

    /// Candidates sorted by descending score. `request_text` must be lower-cased.
    pub fn rank(
        &self,
        intent: &Intent,
        ctx: &RefinementContext,
        request_text: &str,
    ) -> Vec<ScoredStrategy> {
        let mut ranked: Vec<ScoredStrategy> = self
            .candidates(intent)
            .into_iter()
            .map(|strategy| {
                let score = score_strategy(&strategy, ctx, request_text);
                ScoredStrategy { strategy, score }
            })
            .collect();
        // sort_by is stable, equal scores keep enumeration order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

impl Default for StrategyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Score one strategy against the context and lower-cased request text.
pub fn score_strategy(
    strategy: &RefinementStrategy,
    ctx: &RefinementContext,
    request_text: &str,
) -> f64 {
    let kind = strategy.strategy_type;
    let name = kind.to_string();

    let mut score = strategy.success_probability * strategy.context_weight;
    if contains_any(request_text, kind.gate_keywords()) {
        score += KEYWORD_BOOST;
    }
    if ctx.successful_patterns.iter().any(|p| p.contains(&name)) {
        score += SUCCESS_PATTERN_BOOST;
    }
    if ctx.failure_patterns.iter().any(|p| p.contains(&name)) {
        score -= FAILURE_PATTERN_PENALTY;
    }
    clamp_unit(score)
}

/// Used when nothing else is available.
pub fn fallback_strategy() -> RefinementStrategy {
    let kind = StrategyType::StyleRefinement;
    RefinementStrategy {
        strategy_type: kind,
        description: kind.description().to_string(),
        prompt_modifications: kind.prompt_modifications(None),
        context_weight: FALLBACK_CONTEXT_WEIGHT,
        success_probability: FALLBACK_SUCCESS_PROBABILITY,
        length_direction: None,
    }
}

pub fn select_strategy(ranked: &[ScoredStrategy]) -> RefinementStrategy {
    ranked
        .first()
        .map_or_else(fallback_strategy, |top| top.strategy.clone())
}

/// Top `count` entries with distinct strategy types.
pub fn select_alternatives(ranked: &[ScoredStrategy], count: usize) -> Vec<ScoredStrategy> {
    let mut picked: Vec<ScoredStrategy> = Vec::with_capacity(count);
    for entry in ranked {
        if picked.len() == count {
            break;
        }
        if picked
            .iter()
            .all(|p| p.strategy.strategy_type != entry.strategy.strategy_type)
        {
            picked.push(entry.clone());
        }
    }
    picked
}
