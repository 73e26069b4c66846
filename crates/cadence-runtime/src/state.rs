//! Per-target run state.
//!
//! One [`RunState`] exists per target and is shared (behind an `Arc`) by the
//! top-level run and every nested run on that target. All fields sit behind
//! a single `parking_lot` mutex that is never held across an `.await`.

use cadence_core::{RunId, RunResult, TaskId, Timestamp};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Settlement of a run, cloneable so deduplicated callers share it.
pub(crate) type SharedRun<T> = Shared<BoxFuture<'static, RunResult<T>>>;

/// Resolves when the suspension is lifted.
pub(crate) type ResumeFuture = Shared<oneshot::Receiver<()>>;

struct PendingRun<T> {
    run_id: RunId,
    future: SharedRun<T>,
}

struct Suspension {
    tx: oneshot::Sender<()>,
    rx: ResumeFuture,
}

struct Inner<T> {
    active_task: Option<TaskId>,
    pending: Option<PendingRun<T>>,
    resume: Option<Suspension>,
    cancel_mark: Timestamp,
}

impl<T> Inner<T> {
    fn wake_suspended(&mut self) -> bool {
        match self.resume.take() {
            Some(suspension) => {
                let _ = suspension.tx.send(());
                true
            }
            None => false,
        }
    }
}

/// Run bookkeeping for one target.
pub struct RunState<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Default for RunState<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                active_task: None,
                pending: None,
                resume: None,
                cancel_mark: Timestamp::ZERO,
            }),
        }
    }
}

impl<T> std::fmt::Debug for RunState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RunState")
            .field("active_task", &inner.active_task)
            .field("pending", &inner.pending.as_ref().map(|p| p.run_id.as_str()))
            .field("suspended", &inner.resume.is_some())
            .field("cancel_mark", &inner.cancel_mark)
            .finish()
    }
}

impl<T> RunState<T> {
    /// Fresh idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Task currently in flight.
    pub fn active_task(&self) -> Option<TaskId> {
        self.inner.lock().active_task
    }

    /// Latest cancellation boundary.
    pub fn cancel_mark(&self) -> Timestamp {
        self.inner.lock().cancel_mark
    }

    /// Whether no task is in flight.
    pub fn is_idle(&self) -> bool {
        self.inner.lock().active_task.is_none()
    }

    /// Whether a settlement future is stored.
    pub fn has_pending(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Whether a run is waiting for [`RunState::resume`].
    pub fn is_suspended(&self) -> bool {
        self.inner.lock().resume.is_some()
    }

    /// Fire the resume signal. Returns whether one was pending.
    ///
    /// The suspended run re-checks cancellation and the pause flag before
    /// continuing, so resuming while the target still reports paused simply
    /// suspends it again.
    pub fn resume(&self) -> bool {
        self.inner.lock().wake_suspended()
    }

    /// Move the cancellation boundary forward to `timestamp` (never back) and
    /// wake any suspended run so it can observe the cancellation.
    pub(crate) fn advance_cancel_mark(&self, timestamp: Timestamp) {
        let mut inner = self.inner.lock();
        inner.cancel_mark = inner.cancel_mark.max(timestamp);
        let _ = inner.wake_suspended();
    }

    /// Whether a run of `task` started at `timestamp` is void right now.
    pub(crate) fn is_cancelled(&self, task: TaskId, timestamp: Timestamp) -> bool {
        let inner = self.inner.lock();
        inner.active_task != Some(task) || timestamp < inner.cancel_mark
    }

    /// Settlement of the current run, if any.
    pub(crate) fn pending(&self) -> Option<SharedRun<T>> {
        self.inner.lock().pending.as_ref().map(|p| p.future.clone())
    }

    /// Settlement of the in-flight run of `task`, if `task` is the active one.
    pub(crate) fn join(&self, task: TaskId) -> Option<SharedRun<T>> {
        let inner = self.inner.lock();
        if inner.active_task != Some(task) {
            return None;
        }
        inner.pending.as_ref().map(|p| p.future.clone())
    }

    /// Install `task` as the active chain with its settlement future.
    pub(crate) fn claim(&self, task: TaskId, run_id: RunId, future: SharedRun<T>) {
        let mut inner = self.inner.lock();
        inner.active_task = Some(task);
        inner.pending = Some(PendingRun { run_id, future });
        // The previous owner, if suspended, is now void.
        let _ = inner.wake_suspended();
    }

    /// Clear the active task if it is still `task`. Returns whether it was.
    pub(crate) fn release(&self, task: TaskId) -> bool {
        let mut inner = self.inner.lock();
        if inner.active_task == Some(task) {
            inner.active_task = None;
            true
        } else {
            false
        }
    }

    /// Drop the stored settlement if it belongs to `run_id`.
    pub(crate) fn discard_pending(&self, run_id: &RunId) -> bool {
        let mut inner = self.inner.lock();
        if inner.pending.as_ref().is_some_and(|p| &p.run_id == run_id) {
            inner.pending = None;
            true
        } else {
            false
        }
    }

    /// After a nested run settles: if nothing is active, hand identity (and
    /// the settlement slot) back to the parent run.
    pub(crate) fn restore_parent(
        &self,
        task: TaskId,
        run_id: &RunId,
        future: &SharedRun<T>,
    ) -> bool {
        let mut inner = self.inner.lock();
        if inner.active_task.is_some() {
            return false;
        }
        inner.active_task = Some(task);
        inner.pending = Some(PendingRun {
            run_id: run_id.clone(),
            future: future.clone(),
        });
        true
    }

    /// Register interest in the resume signal, creating it if needed. Every
    /// waiter registered before the signal fires is woken by it.
    pub(crate) fn suspend(&self) -> ResumeFuture {
        let mut inner = self.inner.lock();
        if let Some(existing) = &inner.resume {
            return existing.rx.clone();
        }
        let (tx, rx) = oneshot::channel();
        let rx = rx.shared();
        inner.resume = Some(Suspension { tx, rx: rx.clone() });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Outcome, RunError};
    use futures::future;

    fn ready_run(value: i32) -> SharedRun<i32> {
        future::ready(Ok(Outcome::finished(value))).boxed().shared()
    }

    #[test]
    fn new_state_is_idle() {
        let state: RunState<i32> = RunState::new();
        assert!(state.is_idle());
        assert!(!state.has_pending());
        assert!(!state.is_suspended());
        assert_eq!(state.cancel_mark(), Timestamp::ZERO);
    }

    #[test]
    fn cancel_mark_never_moves_back() {
        let state: RunState<i32> = RunState::new();
        state.advance_cancel_mark(Timestamp::from_micros(20));
        state.advance_cancel_mark(Timestamp::from_micros(10));
        assert_eq!(state.cancel_mark(), Timestamp::from_micros(20));
    }

    #[test]
    fn claim_and_release() {
        let state = RunState::new();
        let task = TaskId::next();
        state.claim(task, RunId::new(), ready_run(1));
        assert_eq!(state.active_task(), Some(task));
        assert!(state.join(task).is_some());
        assert!(state.join(TaskId::next()).is_none());

        assert!(!state.release(TaskId::next()));
        assert!(state.release(task));
        assert!(state.is_idle());
    }

    #[test]
    fn is_cancelled_checks_identity_and_mark() {
        let state = RunState::new();
        let task = TaskId::next();
        let started = Timestamp::from_micros(5);
        state.claim(task, RunId::new(), ready_run(1));
        assert!(!state.is_cancelled(task, started));
        assert!(state.is_cancelled(TaskId::next(), started));

        // Equal mark does not void a running run.
        state.advance_cancel_mark(started);
        assert!(!state.is_cancelled(task, started));
        state.advance_cancel_mark(Timestamp::from_micros(6));
        assert!(state.is_cancelled(task, started));
    }

    #[test]
    fn discard_only_own_pending() {
        let state = RunState::new();
        let mine = RunId::new();
        state.claim(TaskId::next(), mine.clone(), ready_run(1));
        assert!(!state.discard_pending(&RunId::new()));
        assert!(state.has_pending());
        assert!(state.discard_pending(&mine));
        assert!(!state.has_pending());
    }

    #[test]
    fn restore_parent_only_when_empty() {
        let state = RunState::new();
        let parent = TaskId::next();
        let parent_run = RunId::new();
        let parent_future = ready_run(0);

        let other = TaskId::next();
        state.claim(other, RunId::new(), ready_run(1));
        assert!(!state.restore_parent(parent, &parent_run, &parent_future));
        assert_eq!(state.active_task(), Some(other));

        let _ = state.release(other);
        assert!(state.restore_parent(parent, &parent_run, &parent_future));
        assert_eq!(state.active_task(), Some(parent));
        assert!(state.join(parent).is_some());
    }

    #[tokio::test]
    async fn resume_wakes_all_waiters() {
        let state: RunState<i32> = RunState::new();
        let first = state.suspend();
        let second = state.suspend();
        assert!(state.is_suspended());

        assert!(state.resume());
        assert!(!state.is_suspended());
        assert!(first.await.is_ok());
        assert!(second.await.is_ok());
        assert!(!state.resume());
    }

    #[tokio::test]
    async fn cancel_wakes_suspended_run() {
        let state: RunState<i32> = RunState::new();
        let waiter = state.suspend();
        state.advance_cancel_mark(Timestamp::from_micros(1));
        assert!(waiter.await.is_ok());
        assert!(!state.is_suspended());
    }

    #[tokio::test]
    async fn shared_settlement_fans_out() {
        let state = RunState::new();
        let task = TaskId::next();
        let failing: SharedRun<i32> =
            future::ready(Err(RunError::Abandoned)).boxed().shared();
        state.claim(task, RunId::new(), failing);
        let a = state.join(task).unwrap();
        let b = state.pending().unwrap();
        assert_eq!(a.await, Err(RunError::Abandoned));
        assert_eq!(b.await, Err(RunError::Abandoned));
    }
}
