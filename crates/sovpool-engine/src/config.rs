//! # Engine Configuration
//!
//! Resolution order: built-in defaults, then an optional YAML file named by
//! `SOVPOOL_CONFIG`, then individual environment overrides. A value that
//! is present but unparseable or out of range is an error; nothing falls
//! back to a default silently.
//!
//! ```yaml
//! max_signatures_per_pool: 10000
//! anchor_retry:
//!   max_attempts: 5
//!   base_delay_ms: 200
//!   max_delay_ms: 10000
//!   attempt_timeout_ms: 30000
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;

pub const ENV_CONFIG_PATH: &str = "SOVPOOL_CONFIG";
pub const ENV_MAX_SIGNATURES: &str = "SOVPOOL_MAX_SIGNATURES_PER_POOL";
pub const ENV_ANCHOR_MAX_ATTEMPTS: &str = "SOVPOOL_ANCHOR_MAX_ATTEMPTS";
pub const ENV_ANCHOR_BASE_DELAY_MS: &str = "SOVPOOL_ANCHOR_BASE_DELAY_MS";
pub const ENV_ANCHOR_MAX_DELAY_MS: &str = "SOVPOOL_ANCHOR_MAX_DELAY_MS";
pub const ENV_ANCHOR_ATTEMPT_TIMEOUT_MS: &str = "SOVPOOL_ANCHOR_ATTEMPT_TIMEOUT_MS";

/// Errors while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables of the pooling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolingConfig {
    /// Leaf count at which a pool seals itself.
    pub max_signatures_per_pool: usize,
    pub anchor_retry: RetryPolicy,
}

impl Default for PoolingConfig {
    fn default() -> Self {
        Self {
            max_signatures_per_pool: 10_000,
            anchor_retry: RetryPolicy::default(),
        }
    }
}

impl PoolingConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|var| std::env::var(var).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(ENV_CONFIG_PATH) {
            Some(path) if !path.trim().is_empty() => Self::from_yaml_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };

        if let Some(v) = lookup(ENV_MAX_SIGNATURES) {
            config.max_signatures_per_pool = parse_env(ENV_MAX_SIGNATURES, &v)?;
        }
        if let Some(v) = lookup(ENV_ANCHOR_MAX_ATTEMPTS) {
            config.anchor_retry.max_attempts = parse_env(ENV_ANCHOR_MAX_ATTEMPTS, &v)?;
        }
        if let Some(v) = lookup(ENV_ANCHOR_BASE_DELAY_MS) {
            config.anchor_retry.base_delay_ms = parse_env(ENV_ANCHOR_BASE_DELAY_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_ANCHOR_MAX_DELAY_MS) {
            config.anchor_retry.max_delay_ms = parse_env(ENV_ANCHOR_MAX_DELAY_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_ANCHOR_ATTEMPT_TIMEOUT_MS) {
            config.anchor_retry.attempt_timeout_ms = parse_env(ENV_ANCHOR_ATTEMPT_TIMEOUT_MS, &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file. Missing keys take defaults; unknown keys fail.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_signatures_per_pool == 0 {
            return Err(ConfigError::Invalid(
                "max_signatures_per_pool must be at least 1".into(),
            ));
        }
        if self.anchor_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "anchor_retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.anchor_retry.attempt_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "anchor_retry.attempt_timeout_ms must be at least 1".into(),
            ));
        }
        if self.anchor_retry.base_delay_ms > self.anchor_retry.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "anchor_retry.base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.anchor_retry.base_delay_ms, self.anchor_retry.max_delay_ms
            )));
        }
        Ok(())
    }
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
