pub mod analyzer;
pub mod augmenter;
pub mod classifier;
pub mod context;
pub mod engine;
pub mod learner;
pub mod metrics;
pub mod strategy;
pub mod types;

pub use classifier::{Intent, IntentClassifier, KeywordClassifier};
pub use engine::{RefinementEngine, create_refinement_engine};
pub use strategy::{ScoredStrategy, StrategyCatalog};
pub use types::{
    AcceptanceLevel, ContentIteration, ContentType, ContextSource, FeedbackAnalysis, FeedbackType,
    LengthDirection, LengthPreference, ProcessingMetrics, Rating, RefinementContext,
    RefinementRequest, RefinementResult, RefinementStrategy, StrategyType, Tone, UserFeedback,
    UserPreferences,
};
