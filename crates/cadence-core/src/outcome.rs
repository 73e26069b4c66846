//! Settlement of a run.

use serde::{Deserialize, Serialize};

/// How a run (or a single step) settled.
///
/// `finished == false` means the chain was cancelled or superseded. It is
/// never used to signal failure; failures travel as `Err(RunError)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome<T> {
    /// Whether the chain ran to completion.
    pub finished: bool,
    /// Target value at the moment of settlement.
    pub value: T,
}

impl<T> Outcome<T> {
    /// Completed outcome.
    pub fn finished(value: T) -> Self {
        Self {
            finished: true,
            value,
        }
    }

    /// Cancelled outcome.
    pub fn cancelled(value: T) -> Self {
        Self {
            finished: false,
            value,
        }
    }

    /// Whether this outcome represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        !self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let done = Outcome::finished(3.0);
        assert!(done.finished);
        assert!(!done.is_cancelled());

        let cancelled = Outcome::cancelled(1.0);
        assert!(!cancelled.finished);
        assert!(cancelled.is_cancelled());
        assert!((cancelled.value - 1.0_f64).abs() < f64::EPSILON);
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(Outcome::finished(2)).unwrap();
        assert_eq!(json, serde_json::json!({"finished": true, "value": 2}));
    }
}
