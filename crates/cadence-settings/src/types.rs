//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial
//! JSON file only needs to mention the values it changes.

use cadence_core::logging::LogFormat;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "logging": { "level": "debug" },
///   "runner": { "maxDepth": 8 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CadenceSettings {
    /// Settings schema version.
    pub version: String,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Orchestrator behaviour.
    pub runner: RunnerSettings,
}

impl Default for CadenceSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            logging: LoggingSettings::default(),
            runner: RunnerSettings::default(),
        }
    }
}

impl CadenceSettings {
    /// Reject values the orchestrator cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.runner.max_depth == 0 {
            return Err(SettingsError::InvalidValue(
                "runner.maxDepth must be at least 1".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "logging.level must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format for stderr.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Orchestrator behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunnerSettings {
    /// Maximum nesting of task descriptors inside one another.
    pub max_depth: u32,
    /// Passthrough fields whose handler/object values on a run's config are
    /// inherited by every step that leaves them unset. `onRest` is never
    /// inherited even when listed.
    pub propagated_fields: Vec<String>,
}

/// Field name of the completion callback.
pub const ON_REST_FIELD: &str = "onRest";

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_depth: 32,
            propagated_fields: [
                "config",
                "immediate",
                "onStart",
                "onChange",
                "onPause",
                "onResume",
                "onProps",
                "onDelayEnd",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl RunnerSettings {
    /// Whether `field` is eligible for default propagation.
    pub fn propagates(&self, field: &str) -> bool {
        field != ON_REST_FIELD && self.propagated_fields.iter().any(|f| f == field)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = CadenceSettings::default();
        assert_eq!(s.version, "0.1.0");
        assert_eq!(s.logging.level, "warn");
        assert_eq!(s.logging.format, LogFormat::Compact);
        assert_eq!(s.runner.max_depth, 32);
        assert!(s.runner.propagated_fields.contains(&"config".to_string()));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn json_field_names_are_camel_case() {
        let json = serde_json::to_value(CadenceSettings::default()).unwrap();
        let runner = json.get("runner").unwrap();
        assert!(runner.get("maxDepth").is_some());
        assert!(runner.get("propagatedFields").is_some());
    }

    #[test]
    fn empty_json_produces_defaults() {
        let s: CadenceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.runner.max_depth, 32);
        assert_eq!(s.logging.level, "warn");
    }

    #[test]
    fn on_rest_never_propagates() {
        let runner = RunnerSettings {
            max_depth: 4,
            propagated_fields: vec!["onRest".into(), "config".into()],
        };
        assert!(!runner.propagates("onRest"));
        assert!(runner.propagates("config"));
        assert!(!runner.propagates("easing"));
    }

    #[test]
    fn zero_depth_is_invalid() {
        let mut s = CadenceSettings::default();
        s.runner.max_depth = 0;
        assert!(matches!(s.validate(), Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn blank_level_is_invalid() {
        let mut s = CadenceSettings::default();
        s.logging.level = "  ".into();
        assert!(s.validate().is_err());
    }
}
