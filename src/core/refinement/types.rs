use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumString};

// ContentType: kind of copy being refined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentType {
    Blog,
    Email,
    Social,
}

// FeedbackType: what the user did with a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeedbackType {
    Accept,
    Reject,
    Refine,
}

// Rating: thumbs up / down, serialized as 1 / -1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn value(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i8::deserialize(deserializer)? {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(serde::de::Error::custom(format!(
                "rating must be 1 or -1, got {other}"
            ))),
        }
    }
}

// AcceptanceLevel: how much editing an accepted draft still needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AcceptanceLevel {
    AsIs,
    LightEdit,
    HeavyEdit,
    Inspiration,
}

/// Feedback attached to exactly one [`ContentIteration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub refinement_request: Option<String>,
    #[serde(default)]
    pub quick_feedback: Vec<String>,
    #[serde(default)]
    pub acceptance_level: Option<AcceptanceLevel>,
}

impl UserFeedback {
    pub fn new(feedback_type: FeedbackType) -> Self {
        Self {
            feedback_type,
            rating: None,
            refinement_request: None,
            quick_feedback: Vec::new(),
            acceptance_level: None,
        }
    }

    pub fn accept() -> Self {
        Self::new(FeedbackType::Accept)
    }

    pub fn reject() -> Self {
        Self::new(FeedbackType::Reject)
    }

    pub fn refine(request: impl Into<String>) -> Self {
        Self::new(FeedbackType::Refine).with_request(request)
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.refinement_request = Some(request.into());
        self
    }

    pub fn with_quick_feedback<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quick_feedback.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_acceptance_level(mut self, level: AcceptanceLevel) -> Self {
        self.acceptance_level = Some(level);
        self
    }

    /// Accepted outright or rated up.
    pub fn is_positive(&self) -> bool {
        self.feedback_type == FeedbackType::Accept || self.rating == Some(Rating::Up)
    }

    /// Rejected outright or rated down.
    pub fn is_negative(&self) -> bool {
        self.feedback_type == FeedbackType::Reject || self.rating == Some(Rating::Down)
    }

    /// Free-text request, empty when none was given.
    pub fn request_text(&self) -> &str {
        self.refinement_request.as_deref().unwrap_or_default()
    }
}

/// One generate-then-critique round inside a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentIteration {
    pub iteration_id: String,
    pub attempt_number: u32,
    pub prompt: String,
    pub generated_content: String,
    #[serde(default)]
    pub user_feedback: Option<UserFeedback>,
    /// Id the analytics subsystem uses for this turn.
    #[serde(default)]
    pub correlation_id: Option<String>,
    pub request_time: DateTime<Utc>,
    pub response_time: DateTime<Utc>,
    #[serde(default)]
    pub user_response_time: Option<DateTime<Utc>>,
}

impl ContentIteration {
    pub fn new(
        attempt_number: u32,
        prompt: impl Into<String>,
        generated_content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            iteration_id: uuid::Uuid::new_v4().to_string(),
            attempt_number,
            prompt: prompt.into(),
            generated_content: generated_content.into(),
            user_feedback: None,
            correlation_id: None,
            request_time: now,
            response_time: now,
            user_response_time: None,
        }
    }

    pub fn with_feedback(mut self, feedback: UserFeedback) -> Self {
        self.attach_feedback(feedback);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// The only mutation an iteration allows after creation.
    pub fn attach_feedback(&mut self, feedback: UserFeedback) {
        self.user_feedback = Some(feedback);
        self.user_response_time = Some(Utc::now());
    }
}

// StrategyType: closed set of refinement approaches
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyType {
    ToneAdjustment,
    LengthModification,
    StructureReorganization,
    ContentExpansion,
    ContentCondensation,
    StyleRefinement,
    TopicRefocus,
    FormatChange,
}

// LengthDirection: which way a length modification goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LengthDirection {
    Expand,
    Condense,
}

/// A scored, ready-to-apply refinement approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementStrategy {
    #[serde(rename = "type")]
    pub strategy_type: StrategyType,
    pub description: String,
    pub prompt_modifications: Vec<String>,
    pub context_weight: f64,
    pub success_probability: f64,
    #[serde(default)]
    pub length_direction: Option<LengthDirection>,
}

// Tone: tone preference learned from feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    Formal,
    Casual,
    Professional,
    Friendly,
}

impl Tone {
    /// Match order when several tones appear in one text.
    pub const ALL: [Self; 4] = [
        Self::Formal,
        Self::Casual,
        Self::Professional,
        Self::Friendly,
    ];
}

// LengthPreference: length preference learned from feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LengthPreference {
    Short,
    Long,
}

/// Per-session learned preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub preferred_tone: Option<Tone>,
    #[serde(default)]
    pub preferred_length: Option<LengthPreference>,
    #[serde(default)]
    pub style_preferences: Vec<String>,
    #[serde(default)]
    pub avoided_patterns: Vec<StrategyType>,
    #[serde(default)]
    pub accepted_patterns: Vec<StrategyType>,
}

/// Everything the scorer and augmenter know about one refinement call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefinementContext {
    pub original_content: String,
    pub feedback_history: Vec<UserFeedback>,
    pub iteration_count: usize,
    pub successful_patterns: BTreeSet<String>,
    pub failure_patterns: Vec<String>,
    pub user_preferences: UserPreferences,
}

// ContextSource: which part of the context shaped a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContextSource {
    OriginalContent,
    FeedbackHistory,
    SuccessfulPatterns,
    FailurePatterns,
    UserPreferences,
}

/// Input to a refinement call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementRequest {
    pub session_id: String,
    /// The iteration the feedback critiques.
    pub iteration_id: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub brief: String,
    /// Feedback that triggered this refinement.
    pub feedback: UserFeedback,
    #[serde(default)]
    pub previous_iterations: Vec<ContentIteration>,
}

impl RefinementRequest {
    pub fn new(
        session_id: impl Into<String>,
        iteration_id: impl Into<String>,
        content_type: ContentType,
        feedback: UserFeedback,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            iteration_id: iteration_id.into(),
            content_type,
            brief: String::new(),
            feedback,
            previous_iterations: Vec::new(),
        }
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }

    pub fn with_history(mut self, iterations: Vec<ContentIteration>) -> Self {
        self.previous_iterations = iterations;
        self
    }

    /// Lower-cased refinement text used for gating and scoring.
    pub fn normalized_request(&self) -> String {
        self.feedback.request_text().to_lowercase()
    }
}

/// Output of a refinement call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementResult {
    pub iteration: ContentIteration,
    pub strategy: RefinementStrategy,
    pub context_used: Vec<ContextSource>,
    pub improvement_hypothesis: String,
    pub confidence_score: f64,
}

/// Per-session processing metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Wall-clock milliseconds of the most recent refinement.
    pub processing_time: u64,
    pub strategy_effectiveness: BTreeMap<StrategyType, i64>,
    pub user_satisfaction_trend: Vec<f64>,
    pub context_accuracy_score: f64,
    #[serde(default)]
    pub refinement_count: u64,
}

/// Batch analysis over a session's feedback history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub dominant_feedback_types: Vec<String>,
    pub preference_signals: UserPreferences,
    pub improvement_suggestions: Vec<String>,
}
