//! # Ledger Configuration
//!
//! Deployment-level tunables, loaded from YAML with environment overrides.
//! Every field has a default, so an empty document (or no document at all)
//! yields the standard ledger: a one-hour refund cutoff.
//!
//! ```yaml
//! refund_cutoff_ms: 3600000
//! event_capacity: 256
//! max_seat_capacity: 10000
//! ```
//!
//! Environment overrides:
//!
//! | Variable                    | Field              |
//! |-----------------------------|--------------------|
//! | `RAILBOOK_REFUND_CUTOFF_MS` | `refund_cutoff_ms` |
//! | `RAILBOOK_EVENT_CAPACITY`   | `event_capacity`   |

use std::path::{Path, PathBuf};

use railbook_core::MILLIS_PER_HOUR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`LedgerConfig::refund_cutoff_ms`].
pub const ENV_REFUND_CUTOFF_MS: &str = "RAILBOOK_REFUND_CUTOFF_MS";

/// Environment variable overriding [`LedgerConfig::event_capacity`].
pub const ENV_EVENT_CAPACITY: &str = "RAILBOOK_EVENT_CAPACITY";

/// Largest accepted [`LedgerConfig::event_capacity`].
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML document is malformed or has unknown fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment override is not a valid number.
    #[error("environment variable {var}={value:?} is not a valid unsigned integer")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A field holds a value the ledger cannot run with.
    #[error("invalid config field {field}: {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Tunables for one ledger deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// How long before the end of the sale window refunds stop being
    /// accepted, in milliseconds.
    pub refund_cutoff_ms: u64,
    /// Buffer size of the lifecycle event channel. Slow subscribers that
    /// fall further behind than this miss events.
    pub event_capacity: usize,
    /// Largest seat capacity a train may be created with.
    pub max_seat_capacity: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            refund_cutoff_ms: MILLIS_PER_HOUR,
            event_capacity: 256,
            max_seat_capacity: 10_000,
        }
    }
}

impl LedgerConfig {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_REFUND_CUTOFF_MS) {
            self.refund_cutoff_ms = parse_env(ENV_REFUND_CUTOFF_MS, value)?;
        }
        if let Some(value) = lookup(ENV_EVENT_CAPACITY) {
            self.event_capacity = parse_env(ENV_EVENT_CAPACITY, value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the ledger cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                reason: "must be at least 1",
            });
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                reason: "must not exceed 65536",
            });
        }
        if self.max_seat_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_seat_capacity",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_one_hour_cutoff() {
        let config = LedgerConfig::default();
        assert_eq!(config.refund_cutoff_ms, 3_600_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(
            LedgerConfig::from_yaml_str("").unwrap(),
            LedgerConfig::default()
        );
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = LedgerConfig::from_yaml_str("refund_cutoff_ms: 60000\n").unwrap();
        assert_eq!(config.refund_cutoff_ms, 60_000);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = LedgerConfig::from_yaml_str("refund_cutof_ms: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let err = LedgerConfig::from_yaml_str("event_capacity: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "event_capacity",
                ..
            }
        ));
    }

    #[test]
    fn oversized_event_capacity_is_rejected() {
        let err = LedgerConfig::from_yaml_str("event_capacity: 1000000\n").unwrap_err();
        assert!(format!("{err}").contains("65536"));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [(ENV_REFUND_CUTOFF_MS, "1800000")].into();
        let config = LedgerConfig::default()
            .with_overrides_from(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.refund_cutoff_ms, 1_800_000);
    }

    #[test]
    fn malformed_env_override_is_rejected() {
        let err = LedgerConfig::default()
            .with_overrides_from(|var| (var == ENV_EVENT_CAPACITY).then(|| "many".to_string()))
            .unwrap_err();
        assert!(format!("{err}").contains(ENV_EVENT_CAPACITY));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LedgerConfig::from_path(Path::new("/nonexistent/railbook.yaml")).unwrap_err();
        assert!(format!("{err}").contains("/nonexistent/railbook.yaml"));
    }
}
