//! # cadence-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`CadenceSettings::default()`]
//! 2. **User file**: `~/.cadence/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CADENCE_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<CadenceSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.cadence/settings.json` with env var
/// overrides. If loading fails, returns compiled defaults.
pub fn get_settings() -> &'static CadenceSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            CadenceSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: CadenceSettings) -> std::result::Result<(), CadenceSettings> {
    SETTINGS.set(settings)
}

/// Install the stderr tracing subscriber described by `logging`.
pub fn init_logging(logging: &LoggingSettings) {
    cadence_core::logging::init_subscriber(&logging.level, logging.format);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = CadenceSettings::default();
        let path = settings_path();
        assert!(path.ends_with(".cadence/settings.json"));
    }

    #[test]
    fn global_settings_are_stable() {
        let first = get_settings();
        let second = get_settings();
        assert!(std::ptr::eq(first, second));
        assert!(init_settings(CadenceSettings::default()).is_err());
    }

    #[test]
    fn init_logging_does_not_panic() {
        init_logging(&LoggingSettings::default());
    }
}
