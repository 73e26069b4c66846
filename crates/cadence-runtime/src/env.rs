//! Shared environment handed to every run on a target.

use std::sync::Arc;

use cadence_core::Clock;
use cadence_settings::RunnerSettings;

use crate::state::RunState;
use crate::target::Animated;

/// State plus collaborators. Nested runs receive the same `Arc`, so they
/// share one cancellation timeline and one pause channel with their parent.
pub(crate) struct RunEnv<T> {
    pub(crate) state: Arc<RunState<T>>,
    pub(crate) target: Arc<dyn Animated<T>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) runner: RunnerSettings,
}
