//! Host configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "retry": { "max_attempts": 5, "base_delay_ms": 500 },
//!   "scoring": { "environment_inherent_bonus": 1.0 },
//!   "champion_seed": 42
//! }
//! ```
//!
//! Every field is optional; omitted ones take their defaults.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use survivor_logic::compatibility::ScoringTable;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub retry: RetryPolicy,
    /// Custom coefficients. `None` uses the canonical table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringTable>,
    /// Seed for the results-screen champion pick. `None` picks from entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champion_seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid host config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("host config failed validation: {0:?}")]
    Invalid(Vec<ConfigError>),
}

/// A value that parses but cannot be used.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroAttempts,
    /// Backoff would stall the host for longer than a class period.
    BaseDelayTooLong(u64),
    /// A coefficient that is NaN or infinite.
    NonFiniteCoefficient(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroAttempts => write!(f, "retry.max_attempts must be at least 1"),
            Self::BaseDelayTooLong(ms) => write!(f, "retry.base_delay_ms {ms} exceeds 60000"),
            Self::NonFiniteCoefficient(at) => write!(f, "coefficient {at} is not finite"),
        }
    }
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        let errors = validate_config(&config);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigLoadError::Invalid(errors))
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Coefficients the controller scores with.
    pub fn scoring_table(&self) -> ScoringTable {
        self.scoring.clone().unwrap_or_default()
    }
}

/// Validate a host configuration, returning all errors found.
pub fn validate_config(config: &HostConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::ZeroAttempts);
    }
    if config.retry.base_delay_ms > 60_000 {
        errors.push(ConfigError::BaseDelayTooLong(config.retry.base_delay_ms));
    }

    if let Some(table) = &config.scoring {
        for (env, weights) in &table.environment_weights {
            for (stat, w) in weights {
                if !w.is_finite() {
                    errors.push(ConfigError::NonFiniteCoefficient(format!("{env}.{stat}")));
                }
            }
        }
        for (stat, w) in &table.city_weights {
            if !w.is_finite() {
                errors.push(ConfigError::NonFiniteCoefficient(format!("city.{stat}")));
            }
        }
    }

    errors
}
