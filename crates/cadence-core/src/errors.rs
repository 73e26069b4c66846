//! Run error types.
//!
//! Cancellation is not a [`RunError`]: a cancelled chain settles with
//! `Outcome { finished: false, .. }`. Every variant here reaches the caller
//! of `run_async`.
//!
//! `Clone` is required: one settlement fans out to every deduplicated caller
//! through a shared future.

/// Failures raised while running a chain of steps.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// The external update collaborator failed to apply a step.
    #[error("Update failed: {0}")]
    Update(String),

    /// A script body returned an error of its own.
    #[error("Script failed: {0}")]
    Script(String),

    /// Nested descriptors recursed past the configured limit.
    #[error("Max nesting depth ({0}) exceeded")]
    DepthExceeded(u32),

    /// The run task ended without publishing a result (panic or abort).
    #[error("Run abandoned before settling")]
    Abandoned,

    /// Internal / unexpected error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RunError {
    /// Build an [`RunError::Update`] from anything displayable.
    pub fn update(err: impl std::fmt::Display) -> Self {
        Self::Update(err.to_string())
    }

    /// Build a [`RunError::Script`] from anything displayable.
    pub fn script(err: impl std::fmt::Display) -> Self {
        Self::Script(err.to_string())
    }

    /// Whether retrying the same chain could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Update(_) | Self::Abandoned => true,
            Self::Script(_) | Self::DepthExceeded(_) | Self::Internal(_) => false,
        }
    }

    /// Error category string for structured logs.
    pub fn category(&self) -> &str {
        match self {
            Self::Update(_) => "update",
            Self::Script(_) => "script",
            Self::DepthExceeded(_) => "depth_exceeded",
            Self::Abandoned => "abandoned",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result of a settled run.
pub type RunResult<T> = Result<crate::outcome::Outcome<T>, RunError>;
