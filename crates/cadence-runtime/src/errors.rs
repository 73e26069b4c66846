//! Step-level error type.

use cadence_core::RunError;

/// Why a step did not produce an outcome.
///
/// [`StepError::Cancelled`] is the cancellation signal: it unwinds a script
/// or sequence (so `?` works inside script bodies) and is converted into a
/// `finished: false` outcome at the run boundary. It never reaches the caller
/// of `run_async` as an error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    /// The run was cancelled, reset, or superseded.
    #[error("Run cancelled")]
    Cancelled,

    /// A genuine failure, propagated to the caller.
    #[error(transparent)]
    Failed(#[from] RunError),
}

impl StepError {
    /// Whether this is the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_display() {
        assert_eq!(StepError::Cancelled.to_string(), "Run cancelled");
        assert!(StepError::Cancelled.is_cancelled());
    }

    #[test]
    fn failed_is_transparent() {
        let err: StepError = RunError::Update("stalled".into()).into();
        assert_eq!(err.to_string(), "Update failed: stalled");
        assert!(!err.is_cancelled());
    }
}
