use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `tastekit`.
///
/// Each subsystem defines its own error variant. Scoring has none: collaborator
/// failures during ranking come back as `Degradation` on the `Ranking`. Library callers can match on
/// these to decide recovery strategy; adapter code (HTTP, SQLite, files, CLI)
/// continues to use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum TasteError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Elicitation ─────────────────────────────────────────────────────
    #[error("elicitation: {0}")]
    Elicitation(#[from] ElicitationError),

    // ── Session ─────────────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),
}

// ─── Elicitation errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ElicitationError {
    #[error("unsupported answer format: {0}")]
    InvalidAnswer(String),

    #[error("unknown question id: {0}")]
    UnknownQuestion(String),

    #[error("invalid question bank: {0}")]
    InvalidBank(String),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("session {0} lock poisoned")]
    LockPoisoned(String),

    #[error("store: {0}")]
    Store(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, TasteError>;

impl TasteError {
    /// True for errors caused by the caller's input; the session is untouched.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::Elicitation(
                ElicitationError::InvalidAnswer(_) | ElicitationError::UnknownQuestion(_)
            )
        )
    }
}
