//! # cadence-runtime
//!
//! Sequencing of asynchronous multi-step updates against a single target.
//!
//! - **Gate**: dedup of identical tasks, cancel and reset requests, delayed admission
//! - **Interrupts**: cancellation and pause checks before and after every step
//! - **Executor**: sequences, scripts, nested tasks on shared state, default field propagation
//! - **Settlement**: outcome arbitration, active-task cleanup, `on_rest` callbacks
//! - **Orchestrator**: the per-target facade exposing `run_async`, `cancel` and `resume`

#![deny(unsafe_code)]

mod env;
pub mod errors;
pub mod executor;
mod gate;
mod interrupts;
pub mod orchestrator;
pub mod state;
pub mod step;
pub mod target;
pub mod task;

pub use cadence_core::{Outcome, RunError, RunResult, TaskId};
pub use errors::StepError;
pub use executor::{Animator, ForceStop};
pub use orchestrator::{Orchestrator, RunFuture};
pub use state::RunState;
pub use step::{Goal, Handler, OnRest, Param, Step, StepConfig};
pub use target::{Animatable, Animated};
pub use task::{ScriptFn, ScriptFuture, Task, TaskKind};
