//! Interruption controller: cancellation and pause checks between steps.

use std::sync::Arc;

use cadence_core::{TaskId, Timestamp};
use tracing::{debug, trace};

use crate::env::RunEnv;
use crate::errors::StepError;
use crate::target::Animatable;

/// Checks a single run performs before and after every step.
pub(crate) struct Interrupts<T> {
    env: Arc<RunEnv<T>>,
    task: TaskId,
    timestamp: Timestamp,
}

impl<T: Animatable> Interrupts<T> {
    pub(crate) fn new(env: Arc<RunEnv<T>>, task: TaskId, timestamp: Timestamp) -> Self {
        Self {
            env,
            task,
            timestamp,
        }
    }

    /// Whether another task replaced this one or a cancellation landed after
    /// this run started. Read from the shared state on every call.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.env.state.is_cancelled(self.task, self.timestamp)
    }

    /// Abort with [`StepError::Cancelled`] if cancelled; otherwise wait out
    /// any pause, re-checking cancellation after every wake-up.
    pub(crate) async fn check(&self) -> Result<(), StepError> {
        loop {
            if self.is_cancelled() {
                trace!(task = %self.task, "run interrupted");
                return Err(StepError::Cancelled);
            }
            if !self.env.target.is_paused() {
                return Ok(());
            }
            let resumed = self.env.state.suspend();
            // Resume may have been requested between the check and the
            // registration above.
            if !self.env.target.is_paused() {
                let _ = self.env.state.resume();
                continue;
            }
            debug!(task = %self.task, "run suspended for pause");
            let _ = resumed.await;
            debug!(task = %self.task, "run woken");
        }
    }
}
