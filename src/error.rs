use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Errors surfaced by the refinement engine.
///
/// Backend failures pass through untouched so callers see the generator's own
/// error chain. Missing iterations inside a request and empty strategy lists
/// are tolerated and never show up here.
#[derive(Debug, Error)]
pub enum RefinementError {
    // ── Generation backend ───────────────────────────────────────────────
    #[error(transparent)]
    Generation(anyhow::Error),

    #[error("generator returned empty content for {content_type}")]
    EmptyGeneration { content_type: String },

    // ── Session ─────────────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Config ──────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("iteration {iteration_id} not found in session {session_id}")]
    IterationNotFound {
        session_id: String,
        iteration_id: String,
    },

    #[error("iteration {iteration_id} in session {session_id} already has feedback")]
    FeedbackAlreadyAttached {
        session_id: String,
        iteration_id: String,
    },
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, RefinementError>;
