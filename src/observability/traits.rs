use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    RefinementStart {
        session_id: String,
        content_type: String,
    },
    RefinementEnd {
        session_id: String,
        strategy: String,
        duration: Duration,
        confidence: f64,
    },
    AlternativeFailed {
        session_id: String,
        strategy: String,
        message: String,
    },
    FeedbackAttached {
        session_id: String,
        feedback_type: String,
    },
    SessionClosed {
        session_id: String,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Numeric metrics
#[derive(Debug, Clone)]
pub enum ObserverMetric {
    RefinementLatency(Duration),
    Confidence(f64),
    ActiveSessions(u64),
    TokensUsed(u64),
}

/// Sink for engine events and metrics.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric
    fn record_metric(&self, metric: &ObserverMetric);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
