//! Collaborator contract for the entity being animated.

use async_trait::async_trait;
use cadence_core::RunResult;

use crate::step::StepConfig;

/// Bounds every animated value type must satisfy.
pub trait Animatable: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Animatable for T {}

/// The mutable target an orchestrator drives.
///
/// The orchestrator never interpolates values itself. It asks the target to
/// apply one step at a time and reads the value back when a run settles.
#[async_trait]
pub trait Animated<T>: Send + Sync {
    /// Current value. Synchronous and side-effect free.
    fn value(&self) -> T;

    /// Whether the target is paused.
    fn is_paused(&self) -> bool;

    /// Apply one step. Must settle exactly once.
    ///
    /// The step's `to` is always a terminal value (or absent); nested tasks
    /// are expanded by the orchestrator before reaching the target.
    async fn update(&self, step: StepConfig<T>) -> RunResult<T>;

    /// Halt current motion immediately. Handed to scripts; the orchestrator
    /// never calls it on its own.
    fn force_stop(&self);
}
