//! Public entry point bound to one target.

use std::sync::Arc;

use cadence_core::{Clock, MonotonicClock, RunResult};
use cadence_settings::{CadenceSettings, RunnerSettings};
use futures::future::BoxFuture;
use tracing::debug;

use crate::env::RunEnv;
use crate::gate;
use crate::state::RunState;
use crate::step::StepConfig;
use crate::target::{Animatable, Animated};
use crate::task::Task;

/// Settlement of a `run_async` call. Resolves with `finished: false` on
/// cancellation and with `Err` only on genuine failure.
pub type RunFuture<T> = BoxFuture<'static, RunResult<T>>;

/// Owns the run state of one target and gates every request against it.
///
/// Cloning yields another handle to the same state. Requests must be issued
/// from within a tokio runtime: runs are spawned as soon as they are admitted.
pub struct Orchestrator<T> {
    env: Arc<RunEnv<T>>,
}

impl<T> Clone for Orchestrator<T> {
    fn clone(&self) -> Self {
        Self {
            env: Arc::clone(&self.env),
        }
    }
}

impl<T> std::fmt::Debug for Orchestrator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.env.state)
            .field("runner", &self.env.runner)
            .finish_non_exhaustive()
    }
}

impl<T: Animatable> Orchestrator<T> {
    /// Orchestrator with the default clock and runner settings.
    pub fn new(target: Arc<dyn Animated<T>>) -> Self {
        Self::with_parts(
            target,
            Arc::new(MonotonicClock::new()),
            RunnerSettings::default(),
        )
    }

    /// Orchestrator configured from loaded settings.
    pub fn from_settings(target: Arc<dyn Animated<T>>, settings: &CadenceSettings) -> Self {
        Self::with_parts(
            target,
            Arc::new(MonotonicClock::new()),
            settings.runner.clone(),
        )
    }

    /// Orchestrator with an explicit clock and runner settings.
    pub fn with_parts(
        target: Arc<dyn Animated<T>>,
        clock: Arc<dyn Clock>,
        runner: RunnerSettings,
    ) -> Self {
        debug!(max_depth = runner.max_depth, "orchestrator created");
        Self {
            env: Arc::new(RunEnv {
                state: Arc::new(RunState::new()),
                target,
                clock,
                runner,
            }),
        }
    }

    /// Gate a request to run `task` under `config`.
    ///
    /// Cancellation, dedup and run start take effect before this returns;
    /// only a configured delay and a reset wait are deferred.
    pub fn run_async(&self, task: Task<T>, config: StepConfig<T>) -> RunFuture<T> {
        gate::run_async(Arc::clone(&self.env), task, config, 0)
    }

    /// Cancel every run on this target started up to now.
    pub fn cancel(&self) -> RunFuture<T> {
        let noop = Task::sequence(Vec::<StepConfig<T>>::new());
        self.run_async(noop, StepConfig::new().with_cancel())
    }

    /// Wake a run suspended for pause. Returns whether one was waiting.
    pub fn resume(&self) -> bool {
        self.env.state.resume()
    }

    /// Run bookkeeping for this target.
    pub fn state(&self) -> &RunState<T> {
        &self.env.state
    }

    /// Current target value.
    pub fn value(&self) -> T {
        self.env.target.value()
    }

    /// Runner settings in effect.
    pub fn runner(&self) -> &RunnerSettings {
        &self.env.runner
    }
}
