//! Step executor and settlement.
//!
//! A run walks its task (sequence or script) through [`Animator::animate`],
//! which brackets every step with interruption checks, expands nested tasks
//! by re-entering the run gate on the same environment, and otherwise hands
//! the step to the target's `update`. When the body exits, the run arbitrates
//! its outcome, releases its identity, and fires its own `on_rest`.

use std::collections::BTreeMap;
use std::sync::Arc;

use cadence_core::{Outcome, RunId, RunResult, TaskId, Timestamp};
use tracing::{trace, warn};

use crate::env::RunEnv;
use crate::errors::StepError;
use crate::gate;
use crate::interrupts::Interrupts;
use crate::state::SharedRun;
use crate::step::{Goal, OnRest, Param, Step, StepConfig};
use crate::target::{Animatable, Animated};
use crate::task::{Task, TaskKind};

/// Everything one run needs, shared with the [`Animator`] handed to scripts.
pub(crate) struct RunContext<T> {
    env: Arc<RunEnv<T>>,
    task: Task<T>,
    run_id: RunId,
    future: SharedRun<T>,
    depth: u32,
    interrupts: Interrupts<T>,
    defaults: BTreeMap<String, Param>,
    on_rest: Option<OnRest<T>>,
}

impl<T: Animatable> RunContext<T> {
    pub(crate) fn new(
        env: Arc<RunEnv<T>>,
        task: Task<T>,
        config: &StepConfig<T>,
        timestamp: Timestamp,
        depth: u32,
        run_id: RunId,
        future: SharedRun<T>,
    ) -> Self {
        let defaults = collect_defaults(config, &env);
        let interrupts = Interrupts::new(Arc::clone(&env), task.id(), timestamp);
        Self {
            env,
            task,
            run_id,
            future,
            depth,
            interrupts,
            defaults,
            on_rest: config.on_rest.clone(),
        }
    }

    fn apply_defaults(&self, config: &mut StepConfig<T>) {
        for (key, value) in &self.defaults {
            let _ = config
                .params
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// Passthrough values on the run's config that nested steps inherit.
fn collect_defaults<T>(config: &StepConfig<T>, env: &RunEnv<T>) -> BTreeMap<String, Param> {
    config
        .params
        .iter()
        .filter(|(key, value)| env.runner.propagates(key) && value.is_inheritable())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Issues steps on behalf of a run. Handed to script bodies.
pub struct Animator<T> {
    ctx: Arc<RunContext<T>>,
}

impl<T> Clone for Animator<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<T: Animatable> Animator<T> {
    /// Apply one step and wait for it to settle.
    ///
    /// Returns [`StepError::Cancelled`] if the run was cancelled before or
    /// during the step; scripts should propagate it with `?`.
    pub async fn animate(&self, step: impl Into<Step<T>>) -> Result<Outcome<T>, StepError> {
        animate(&self.ctx, step.into()).await
    }

    /// Shorthand for animating to a bare value.
    pub async fn to(&self, value: T) -> Result<Outcome<T>, StepError> {
        animate(&self.ctx, Step::Value(value)).await
    }

    /// Whether the run has been cancelled or superseded.
    pub fn is_cancelled(&self) -> bool {
        self.ctx.interrupts.is_cancelled()
    }

    /// Current target value.
    pub fn value(&self) -> T {
        self.ctx.env.target.value()
    }

    /// Identity of the task this animator belongs to.
    pub fn task_id(&self) -> TaskId {
        self.ctx.task.id()
    }
}

/// Halts the target's motion immediately. Handed to script bodies.
pub struct ForceStop<T> {
    target: Arc<dyn Animated<T>>,
}

impl<T> Clone for ForceStop<T> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
        }
    }
}

impl<T> ForceStop<T> {
    /// Stop the target now. Does not cancel the run by itself.
    pub fn stop(&self) {
        self.target.force_stop();
    }
}

async fn animate<T: Animatable>(
    ctx: &Arc<RunContext<T>>,
    step: Step<T>,
) -> Result<Outcome<T>, StepError> {
    ctx.interrupts.check().await?;

    let mut config = step.into_config();
    ctx.apply_defaults(&mut config);

    let nested = match &config.to {
        Some(Goal::Task(task)) => Some(task.clone()),
        _ => None,
    };

    let outcome = if let Some(nested) = nested {
        trace!(parent = %ctx.task.id(), nested = %nested.id(), "entering nested task");
        let settled =
            gate::run_async(Arc::clone(&ctx.env), nested, config, ctx.depth + 1).await;
        if settled.is_ok()
            && ctx
                .env
                .state
                .restore_parent(ctx.task.id(), &ctx.run_id, &ctx.future)
        {
            trace!(task = %ctx.task.id(), "restored parent identity");
        }
        settled?
    } else {
        ctx.env.target.update(config).await?
    };

    ctx.interrupts.check().await?;
    Ok(outcome)
}

async fn drive<T: Animatable>(ctx: &Arc<RunContext<T>>) -> Result<(), StepError> {
    match ctx.task.kind() {
        TaskKind::Sequence(steps) => {
            for (index, step) in steps.iter().enumerate() {
                trace!(task = %ctx.task.id(), index, "sequence step");
                let _ = animate(ctx, step.clone()).await?;
            }
            Ok(())
        }
        TaskKind::Script(body) => {
            let animator = Animator {
                ctx: Arc::clone(ctx),
            };
            let stop = ForceStop {
                target: Arc::clone(&ctx.env.target),
            };
            body(animator, stop).await
        }
    }
}

/// Clears the active task on every exit path, panics included.
struct ReleaseGuard<'a, T> {
    ctx: &'a RunContext<T>,
}

impl<T> Drop for ReleaseGuard<'_, T> {
    fn drop(&mut self) {
        if self.ctx.env.state.release(self.ctx.task.id()) {
            trace!(task = %self.ctx.task.id(), "released active task");
        }
    }
}

/// Run the task to settlement.
pub(crate) async fn execute<T: Animatable>(ctx: Arc<RunContext<T>>) -> RunResult<T> {
    let guard = ReleaseGuard { ctx: &ctx };

    let settled = match drive(&ctx).await {
        Ok(()) => Ok(Outcome::finished(ctx.env.target.value())),
        Err(StepError::Cancelled) => Ok(Outcome::cancelled(ctx.env.target.value())),
        Err(StepError::Failed(err)) => {
            let _ = ctx.env.state.discard_pending(&ctx.run_id);
            warn!(
                task = %ctx.task.id(),
                category = err.category(),
                error = %err,
                "run failed"
            );
            Err(err)
        }
    };

    drop(guard);

    if let (Ok(outcome), Some(on_rest)) = (&settled, &ctx.on_rest) {
        on_rest(outcome);
    }
    trace!(
        task = %ctx.task.id(),
        finished = settled.as_ref().is_ok_and(|o| o.finished),
        "run settled"
    );
    settled
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::MonotonicClock;
    use cadence_settings::RunnerSettings;

    use crate::state::RunState;

    struct Inert;

    #[async_trait::async_trait]
    impl Animated<i32> for Inert {
        fn value(&self) -> i32 {
            0
        }
        fn is_paused(&self) -> bool {
            false
        }
        async fn update(&self, _step: StepConfig<i32>) -> RunResult<i32> {
            Ok(Outcome::finished(0))
        }
        fn force_stop(&self) {}
    }

    fn env(runner: RunnerSettings) -> RunEnv<i32> {
        RunEnv {
            state: Arc::new(RunState::new()),
            target: Arc::new(Inert),
            clock: Arc::new(MonotonicClock::new()),
            runner,
        }
    }

    #[test]
    fn defaults_keep_only_inheritable_propagated_fields() {
        let config: StepConfig<i32> = StepConfig::new()
            .with_param("config", serde_json::json!({"tension": 120}))
            .with_param("immediate", serde_json::json!(true))
            .with_param("easing", serde_json::json!({"kind": "linear"}))
            .with_handler("onChange", |_| {})
            .with_handler("onRest", |_| {});

        let defaults = collect_defaults(&config, &env(RunnerSettings::default()));
        let keys: Vec<&str> = defaults.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["config", "onChange"]);
    }

    #[test]
    fn defaults_respect_configured_field_set() {
        let runner = RunnerSettings {
            max_depth: 4,
            propagated_fields: vec!["easing".into()],
        };
        let config: StepConfig<i32> = StepConfig::new()
            .with_param("config", serde_json::json!({"tension": 120}))
            .with_param("easing", serde_json::json!({"kind": "linear"}));

        let defaults = collect_defaults(&config, &env(runner));
        assert_eq!(defaults.len(), 1);
        assert!(defaults.contains_key("easing"));
    }
}
