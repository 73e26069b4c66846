//! Step configuration.
//!
//! A [`StepConfig`] carries the control fields the orchestrator understands
//! (`to`, `delay_ms`, `cancel`, `reset`, `on_rest`) plus an open map of
//! passthrough [`Param`]s that only the update collaborator interprets.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use cadence_core::Outcome;
use serde_json::Value;

use crate::task::Task;

/// Passthrough callback, e.g. an `onChange` listener for the update engine.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Completion callback invoked with a run's final outcome.
pub type OnRest<T> = Arc<dyn Fn(&Outcome<T>) + Send + Sync>;

/// A passthrough field value.
#[derive(Clone)]
pub enum Param {
    /// Plain data.
    Value(Value),
    /// Callback.
    Handler(Handler),
}

impl Param {
    /// Whether this value may be inherited by nested steps.
    ///
    /// Handlers and object/array values qualify; scalars and `null` do not.
    pub fn is_inheritable(&self) -> bool {
        match self {
            Self::Handler(_) => true,
            Self::Value(v) => v.is_object() || v.is_array(),
        }
    }

    /// The data, if this is a [`Param::Value`].
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Handler(_) => None,
        }
    }

    /// Invoke the handler, if this is a [`Param::Handler`]. Returns whether
    /// anything was called.
    pub fn call(&self, arg: &Value) -> bool {
        match self {
            Self::Handler(f) => {
                f(arg);
                true
            }
            Self::Value(_) => false,
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// Destination of a step: a terminal value or a nested chain.
pub enum Goal<T> {
    /// Terminal value handed to the update collaborator.
    Value(T),
    /// Nested sequence or script run on the same state.
    Task(Task<T>),
}

impl<T: Clone> Clone for Goal<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(v) => Self::Value(v.clone()),
            Self::Task(t) => Self::Task(t.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Goal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Task(t) => f.debug_tuple("Task").field(&t.id()).finish(),
        }
    }
}

/// Configuration of one step (or of a whole run).
pub struct StepConfig<T> {
    /// Where the step goes.
    pub to: Option<Goal<T>>,
    /// Milliseconds to wait before the request is gated.
    pub delay_ms: Option<u64>,
    /// Cancel every run sharing the state.
    pub cancel: bool,
    /// Cancel, wait for the current run to unwind, then start.
    pub reset: bool,
    /// Completion callback for this run only. Never inherited.
    pub on_rest: Option<OnRest<T>>,
    /// Passthrough fields for the update collaborator.
    pub params: BTreeMap<String, Param>,
}

impl<T> Default for StepConfig<T> {
    fn default() -> Self {
        Self {
            to: None,
            delay_ms: None,
            cancel: false,
            reset: false,
            on_rest: None,
            params: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Clone for StepConfig<T> {
    fn clone(&self) -> Self {
        Self {
            to: self.to.clone(),
            delay_ms: self.delay_ms,
            cancel: self.cancel,
            reset: self.reset,
            on_rest: self.on_rest.clone(),
            params: self.params.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StepConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepConfig")
            .field("to", &self.to)
            .field("delay_ms", &self.delay_ms)
            .field("cancel", &self.cancel)
            .field("reset", &self.reset)
            .field("on_rest", &self.on_rest.as_ref().map(|_| ".."))
            .field("params", &self.params)
            .finish()
    }
}

impl<T> StepConfig<T> {
    /// Empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config heading to a terminal value.
    pub fn to(value: T) -> Self {
        Self {
            to: Some(Goal::Value(value)),
            ..Self::default()
        }
    }

    /// Config running a nested chain.
    pub fn nested(task: Task<T>) -> Self {
        Self {
            to: Some(Goal::Task(task)),
            ..Self::default()
        }
    }

    /// Set the pre-gate delay.
    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = Some(ms);
        self
    }

    /// Request cancellation.
    #[must_use]
    pub fn with_cancel(mut self) -> Self {
        self.cancel = true;
        self
    }

    /// Request a reset.
    #[must_use]
    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }

    /// Attach a completion callback.
    #[must_use]
    pub fn with_on_rest(mut self, f: impl Fn(&Outcome<T>) + Send + Sync + 'static) -> Self {
        self.on_rest = Some(Arc::new(f));
        self
    }

    /// Set a passthrough data field.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        let _ = self.params.insert(key.into(), value.into());
        self
    }

    /// Set a passthrough callback field.
    #[must_use]
    pub fn with_handler(
        mut self,
        key: impl Into<String>,
        f: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Self {
        let _ = self
            .params
            .insert(key.into(), Param::Handler(Arc::new(f)));
        self
    }

    /// Terminal value, if the step has one.
    pub fn target_value(&self) -> Option<&T> {
        match &self.to {
            Some(Goal::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Passthrough field by name.
    pub fn param(&self, key: &str) -> Option<&Param> {
        self.params.get(key)
    }
}

/// Anything `animate` accepts. Bare values and bare tasks are wrapped as
/// `{ to: .. }`.
pub enum Step<T> {
    /// Full configuration.
    Config(StepConfig<T>),
    /// Bare terminal value.
    Value(T),
    /// Bare nested chain.
    Task(Task<T>),
}

impl<T> Step<T> {
    /// Normalize into a configuration object.
    pub fn into_config(self) -> StepConfig<T> {
        match self {
            Self::Config(c) => c,
            Self::Value(v) => StepConfig::to(v),
            Self::Task(t) => StepConfig::nested(t),
        }
    }
}

impl<T: Clone> Clone for Step<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Config(c) => Self::Config(c.clone()),
            Self::Value(v) => Self::Value(v.clone()),
            Self::Task(t) => Self::Task(t.clone()),
        }
    }
}

impl<T> From<StepConfig<T>> for Step<T> {
    fn from(c: StepConfig<T>) -> Self {
        Self::Config(c)
    }
}

impl<T> From<Task<T>> for Step<T> {
    fn from(t: Task<T>) -> Self {
        Self::Task(t)
    }
}
