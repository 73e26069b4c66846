//! Time source used for cancellation ordering.
//!
//! The orchestrator compares run start times against a cancellation mark, so
//! the only property that matters is ordering. [`MonotonicClock`] guarantees
//! strictly increasing readings even when two calls land in the same
//! microsecond; [`ManualClock`] lets tests drive time explicitly.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A point on the clock, in microseconds since the clock's origin.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The origin. No clock reading is ever at or below it.
    pub const ZERO: Self = Self(0);

    /// Build from a raw microsecond count.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Raw microsecond count.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Current reading. Never decreases between calls.
    fn now(&self) -> Timestamp;
}

/// Wall-clock backed source that never repeats a reading.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
    last: AtomicU64,
}

impl MonotonicClock {
    /// Create a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last: AtomicU64::new(0),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let elapsed = u64::try_from(self.origin.elapsed().as_micros()).unwrap_or(u64::MAX);
        let mut current = self.last.load(Ordering::Acquire);
        loop {
            let next = elapsed.max(current.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Timestamp(next),
                Err(observed) => current = observed,
            }
        }
    }
}

/// Manually driven clock. Each reading advances by one tick unless the
/// clock is frozen.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    frozen: AtomicBool,
}

impl ManualClock {
    /// Create a ticking clock starting at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump forward by `micros`.
    pub fn advance(&self, micros: u64) {
        let _ = self.now.fetch_add(micros, Ordering::AcqRel);
    }

    /// Stop ticking: every reading returns the same value until unfrozen.
    pub fn freeze(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Release);
    }

    /// Reading without advancing.
    #[must_use]
    pub fn peek(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::Acquire))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        if self.frozen.load(Ordering::Acquire) {
            return self.peek();
        }
        Timestamp(self.now.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
