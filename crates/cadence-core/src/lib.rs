//! # cadence-core
//!
//! Foundation types shared by every Cadence crate:
//!
//! - **Identifiers**: [`TaskId`] (descriptor identity) and [`RunId`] (log correlation)
//! - **Time**: [`Timestamp`] and the [`Clock`] trait with [`MonotonicClock`] / [`ManualClock`]
//! - **Settlement**: [`Outcome`] and [`RunError`]
//! - **Logging**: [`logging::init_subscriber`]

#![deny(unsafe_code)]

pub mod clock;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod outcome;

pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use errors::{RunError, RunResult};
pub use ids::{RunId, TaskId};
pub use outcome::Outcome;
