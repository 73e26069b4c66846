//! Run gate: dedup, cancel, reset, and run start.
//!
//! Everything except the optional delay and the reset wait happens
//! synchronously inside [`run_async`], so back-to-back requests observe each
//! other's effects before either future is polled. Deferred admission is
//! spawned, so it never depends on the caller polling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cadence_core::{Outcome, RunError, RunId, RunResult, Timestamp};
use futures::future::{self, BoxFuture};
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, info_span, warn, Instrument};

use crate::env::RunEnv;
use crate::executor::{self, RunContext};
use crate::state::SharedRun;
use crate::step::StepConfig;
use crate::target::Animatable;
use crate::task::Task;

/// Gate a request for `task` against the runs already sharing `env`.
///
/// `depth` is 0 for top-level requests and grows by one per nested task.
/// Must be called from within a tokio runtime.
pub(crate) fn run_async<T: Animatable>(
    env: Arc<RunEnv<T>>,
    task: Task<T>,
    config: StepConfig<T>,
    depth: u32,
) -> BoxFuture<'static, RunResult<T>> {
    let timestamp = env.clock.now();

    match config.delay_ms.filter(|ms| *ms > 0) {
        Some(ms) => {
            debug!(task = %task.id(), delay_ms = ms, "delaying request");
            detach(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                admit(env, task, config, timestamp, depth).await
            })
        }
        None => admit(env, task, config, timestamp, depth),
    }
}

fn admit<T: Animatable>(
    env: Arc<RunEnv<T>>,
    task: Task<T>,
    config: StepConfig<T>,
    timestamp: Timestamp,
    depth: u32,
) -> BoxFuture<'static, RunResult<T>> {
    let state = &env.state;

    if config.cancel {
        debug!(task = %task.id(), %timestamp, "cancel requested");
        state.advance_cancel_mark(timestamp);
    }

    if timestamp <= state.cancel_mark() {
        debug!(task = %task.id(), %timestamp, "request voided by cancellation");
        let outcome = Outcome::cancelled(env.target.value());
        return future::ready(Ok(outcome)).boxed();
    }

    if depth > env.runner.max_depth {
        let max = env.runner.max_depth;
        warn!(task = %task.id(), depth, max, "nesting too deep");
        return future::ready(Err(RunError::DepthExceeded(max))).boxed();
    }

    if config.reset {
        state.advance_cancel_mark(timestamp);
        let previous = state.pending();
        debug!(
            task = %task.id(),
            waiting = previous.is_some(),
            "reset requested"
        );
        return detach(async move {
            // Only the prior run's completion matters, not its outcome.
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            // A later reset or cancel landed while waiting; it owns the state.
            if timestamp < env.state.cancel_mark() {
                debug!(task = %task.id(), %timestamp, "reset superseded while waiting");
                return Ok(Outcome::cancelled(env.target.value()));
            }
            start(env, task, &config, timestamp, depth).await
        });
    }

    if let Some(existing) = state.join(task.id()) {
        debug!(task = %task.id(), "joining in-flight run");
        return existing.boxed();
    }

    start(env, task, &config, timestamp, depth)
}

/// Drive deferred admission on its own task so it proceeds even if the
/// caller drops the returned future.
fn detach<T, F>(work: F) -> BoxFuture<'static, RunResult<T>>
where
    T: Animatable,
    F: Future<Output = RunResult<T>> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let _ = tokio::spawn(
        async move {
            let _ = tx.send(work.await);
        }
        .in_current_span(),
    );
    async move { rx.await.unwrap_or_else(|_| Err(RunError::Abandoned)) }.boxed()
}

/// Claim the state for `task` and spawn its run.
fn start<T: Animatable>(
    env: Arc<RunEnv<T>>,
    task: Task<T>,
    config: &StepConfig<T>,
    timestamp: Timestamp,
    depth: u32,
) -> BoxFuture<'static, RunResult<T>> {
    let run_id = RunId::new();
    let (tx, rx) = oneshot::channel();
    let future: SharedRun<T> = async move {
        rx.await.unwrap_or_else(|_| Err(RunError::Abandoned))
    }
    .boxed()
    .shared();

    env.state.claim(task.id(), run_id.clone(), future.clone());
    debug!(task = %task.id(), %run_id, depth, "run started");

    let span = info_span!("run", task = %task.id(), run_id = %run_id, depth);
    let ctx = Arc::new(RunContext::new(
        env,
        task,
        config,
        timestamp,
        depth,
        run_id,
        future.clone(),
    ));
    let _ = tokio::spawn(
        async move {
            let _ = tx.send(executor::execute(ctx).await);
        }
        .instrument(span),
    );

    future.boxed()
}
