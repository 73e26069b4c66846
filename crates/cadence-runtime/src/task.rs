//! Task descriptors.
//!
//! A [`Task`] is either an ordered list of steps or a script that drives its
//! own steps through an [`Animator`]. Identity is the [`TaskId`] assigned at
//! construction: clones are the same task, rebuilding is a new one.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use cadence_core::TaskId;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::errors::StepError;
use crate::executor::{Animator, ForceStop};
use crate::step::Step;

/// Boxed script future.
pub type ScriptFuture = BoxFuture<'static, Result<(), StepError>>;

/// Script body.
pub type ScriptFn<T> = Arc<dyn Fn(Animator<T>, ForceStop<T>) -> ScriptFuture + Send + Sync>;

/// What a task does.
pub enum TaskKind<T> {
    /// Steps applied strictly in order.
    Sequence(Vec<Step<T>>),
    /// User control script, invoked once per run.
    Script(ScriptFn<T>),
}

/// A chain of steps with stable identity.
pub struct Task<T> {
    id: TaskId,
    kind: Arc<TaskKind<T>>,
}

impl<T> Task<T> {
    /// Ordered sequence of steps.
    pub fn sequence<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step<T>>,
    {
        Self::from_kind(TaskKind::Sequence(
            steps.into_iter().map(Into::into).collect(),
        ))
    }

    /// Sequence of bare terminal values.
    pub fn values(values: impl IntoIterator<Item = T>) -> Self {
        Self::from_kind(TaskKind::Sequence(
            values.into_iter().map(Step::Value).collect(),
        ))
    }

    /// Script task. The body receives an [`Animator`] for issuing steps and a
    /// [`ForceStop`] handle for halting motion immediately.
    pub fn script<F, Fut>(body: F) -> Self
    where
        F: Fn(Animator<T>, ForceStop<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), StepError>> + Send + 'static,
    {
        let body: ScriptFn<T> = Arc::new(move |animate, stop| body(animate, stop).boxed());
        Self::from_kind(TaskKind::Script(body))
    }

    fn from_kind(kind: TaskKind<T>) -> Self {
        Self {
            id: TaskId::next(),
            kind: Arc::new(kind),
        }
    }

    /// Identity of this descriptor.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Descriptor body.
    pub fn kind(&self) -> &TaskKind<T> {
        &self.kind
    }

    /// Whether this is a script.
    pub fn is_script(&self) -> bool {
        matches!(*self.kind, TaskKind::Script(_))
    }

    /// Number of steps for a sequence, `None` for a script.
    pub fn len(&self) -> Option<usize> {
        match &*self.kind {
            TaskKind::Sequence(steps) => Some(steps.len()),
            TaskKind::Script(_) => None,
        }
    }

    /// Whether this is a sequence with no steps.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            kind: Arc::clone(&self.kind),
        }
    }
}

impl<T> PartialEq for Task<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Task<T> {}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.kind {
            TaskKind::Sequence(steps) => format!("Sequence({})", steps.len()),
            TaskKind::Script(_) => "Script".to_string(),
        };
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("kind", &kind)
            .finish()
    }
}
