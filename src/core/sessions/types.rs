use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::refinement::types::{
    ContentIteration, ProcessingMetrics, StrategyType, UserFeedback, UserPreferences,
};
use crate::error::SessionError;

/// Everything the engine remembers about one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub last_activity: DateTime<Utc>,
    pub preferences: UserPreferences,
    pub metrics: ProcessingMetrics,
    /// Iterations in the order they were recorded.
    pub iterations: Vec<ContentIteration>,
    /// Strategy behind each engine-produced iteration, keyed by iteration id.
    pub iteration_strategies: HashMap<String, StrategyType>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            last_activity: Utc::now(),
            preferences: UserPreferences::default(),
            metrics: ProcessingMetrics::default(),
            iterations: Vec::new(),
            iteration_strategies: HashMap::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn record_iteration(&mut self, iteration: ContentIteration, strategy: Option<StrategyType>) {
        if let Some(kind) = strategy {
            self.iteration_strategies
                .insert(iteration.iteration_id.clone(), kind);
        }
        self.iterations.push(iteration);
        self.touch();
    }

    /// Check that `iteration_id` is recorded and still waiting for feedback.
    ///
    /// Feedback is final once attached.
    pub fn ensure_feedback_slot(&self, iteration_id: &str) -> Result<(), SessionError> {
        let Some(iteration) = self
            .iterations
            .iter()
            .find(|it| it.iteration_id == iteration_id)
        else {
            return Err(SessionError::IterationNotFound {
                session_id: self.session_id.clone(),
                iteration_id: iteration_id.to_string(),
            });
        };
        if iteration.user_feedback.is_some() {
            return Err(SessionError::FeedbackAlreadyAttached {
                session_id: self.session_id.clone(),
                iteration_id: iteration_id.to_string(),
            });
        }
        Ok(())
    }

    /// Attach feedback to a recorded iteration that has none yet.
    pub fn attach_feedback(
        &mut self,
        iteration_id: &str,
        feedback: UserFeedback,
    ) -> Result<(), SessionError> {
        self.ensure_feedback_slot(iteration_id)?;
        if let Some(iteration) = self
            .iterations
            .iter_mut()
            .find(|it| it.iteration_id == iteration_id)
        {
            iteration.attach_feedback(feedback);
        }
        self.touch();
        Ok(())
    }

    pub fn strategy_for(&self, iteration_id: &str) -> Option<StrategyType> {
        self.iteration_strategies.get(iteration_id).copied()
    }

    /// Feedback on recorded iterations, in recording order.
    pub fn feedback_history(&self) -> Vec<UserFeedback> {
        self.iterations
            .iter()
            .filter_map(|it| it.user_feedback.clone())
            .collect()
    }
}
