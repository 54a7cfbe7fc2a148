use super::traits::{Observer, ObserverEvent, ObserverMetric};
use tracing::{info, warn};

/// Emits every event and metric as a structured `tracing` record.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::RefinementStart {
                session_id,
                content_type,
            } => {
                info!(session_id = %session_id, content_type = %content_type, "refinement.start");
            }
            ObserverEvent::RefinementEnd {
                session_id,
                strategy,
                duration,
                confidence,
            } => {
                info!(
                    session_id = %session_id,
                    strategy = %strategy,
                    duration_ms = millis(*duration),
                    confidence = confidence,
                    "refinement.end"
                );
            }
            ObserverEvent::AlternativeFailed {
                session_id,
                strategy,
                message,
            } => {
                warn!(
                    session_id = %session_id,
                    strategy = %strategy,
                    error = %message,
                    "refinement.alternative_failed"
                );
            }
            ObserverEvent::FeedbackAttached {
                session_id,
                feedback_type,
            } => {
                info!(session_id = %session_id, feedback_type = %feedback_type, "feedback.attached");
            }
            ObserverEvent::SessionClosed { session_id } => {
                info!(session_id = %session_id, "session.closed");
            }
            ObserverEvent::Error { component, message } => {
                warn!(component = %component, error = %message, "error");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::RefinementLatency(d) => {
                info!(latency_ms = millis(*d), "metric.refinement_latency");
            }
            ObserverMetric::Confidence(c) => {
                info!(confidence = c, "metric.confidence");
            }
            ObserverMetric::ActiveSessions(s) => {
                info!(sessions = s, "metric.active_sessions");
            }
            ObserverMetric::TokensUsed(t) => {
                info!(tokens = t, "metric.tokens_used");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
