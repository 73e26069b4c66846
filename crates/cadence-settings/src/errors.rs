//! Settings error types.

use thiserror::Error;

/// Why `~/.cadence/settings.json` (plus env overrides) could not become a
/// usable [`CadenceSettings`](crate::CadenceSettings).
///
/// A missing file is not an error; loading falls back to defaults.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file exists but could not be read.
    #[error("cannot read cadence settings: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not JSON, or a field has the wrong shape
    /// (e.g. `runner.propagatedFields` that is not a string array).
    #[error("malformed cadence settings: {0}")]
    Json(#[from] serde_json::Error),
    /// The merged settings parsed but cannot drive an orchestrator
    /// (e.g. `runner.maxDepth` of 0).
    #[error("rejected cadence setting: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
