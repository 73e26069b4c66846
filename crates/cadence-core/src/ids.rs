//! Identifier newtypes.
//!
//! Two kinds of identity live here:
//!
//! - [`TaskId`]: a monotonically assigned `u64` that gives a task descriptor
//!   its identity. Clones of a descriptor share the id; building a new
//!   descriptor (even with identical contents) allocates a fresh one.
//! - [`RunId`]: a UUID v7 string attached to every run for log correlation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a task descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocate the next id. Ids are never reused within a process.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

branded_id! {
    /// Unique identifier for a single run, used to correlate log lines.
    RunId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_increase() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn task_id_is_copy_and_comparable() {
        let a = TaskId::next();
        let copy = a;
        assert_eq!(a, copy);
    }

    #[test]
    fn task_id_display() {
        let id = TaskId(42);
        assert_eq!(id.to_string(), "task-42");
    }

    #[test]
    fn task_id_serializes_as_number() {
        let json = serde_json::to_string(&TaskId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn run_id_new_is_uuid_v7() {
        let id = RunId::new();
        let parsed = Uuid::parse_str(id.as_str()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::default());
    }

    #[test]
    fn run_id_from_str() {
        let id = RunId::from("run-1");
        assert_eq!(id.as_str(), "run-1");
        assert_eq!(format!("{id}"), "run-1");
    }
}
