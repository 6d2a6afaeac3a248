//! Container configuration.
//!
//! Configuration can be built in code, read from environment variables, or
//! (with the `config` feature) parsed from JSON.

use std::env;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::Deserialize;

use crate::error::{DiError, DiResult};
use crate::internal::MAX_DEPTH;

/// Maximum resolution depth used when nothing overrides it.
pub const DEFAULT_MAX_DEPTH: usize = MAX_DEPTH;

/// Environment variable holding the maximum resolution depth.
pub const ENV_MAX_DEPTH: &str = "AUTOWIRE_MAX_DEPTH";
/// Environment variable holding the per-release timeout in milliseconds.
pub const ENV_DISPOSE_TIMEOUT_MS: &str = "AUTOWIRE_DISPOSE_TIMEOUT_MS";

/// Tunables for a [`Container`](crate::Container).
///
/// # Examples
///
/// ```
/// use autowire::{Container, ContainerConfig};
/// use std::time::Duration;
///
/// let config = ContainerConfig::default()
///     .max_depth(64)
///     .dispose_timeout(Duration::from_secs(5));
///
/// let container = Container::with_config(config);
/// assert_eq!(container.config().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Deepest dependency chain a single resolution may build.
    pub max_depth: usize,
    /// Upper bound for each release operation during teardown. `None` waits
    /// indefinitely.
    pub dispose_timeout: Option<Duration>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            dispose_timeout: None,
        }
    }
}

impl ContainerConfig {
    /// Sets the maximum resolution depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Bounds every release operation by `timeout`.
    pub fn dispose_timeout(mut self, timeout: Duration) -> Self {
        self.dispose_timeout = Some(timeout);
        self
    }

    /// Reads overrides from `AUTOWIRE_MAX_DEPTH` and
    /// `AUTOWIRE_DISPOSE_TIMEOUT_MS`; unset variables keep their defaults.
    pub fn from_env() -> DiResult<Self> {
        let mut config = Self::default();

        if let Some(depth) = read_env::<usize>(ENV_MAX_DEPTH)? {
            config.max_depth = depth;
        }
        if let Some(ms) = read_env::<u64>(ENV_DISPOSE_TIMEOUT_MS)? {
            config.dispose_timeout = Some(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses `{"max_depth": 64, "dispose_timeout_ms": 500}`; missing fields
    /// keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            max_depth: Option<usize>,
            dispose_timeout_ms: Option<u64>,
        }

        let raw: Raw = serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))?;
        let mut config = Self::default();
        if let Some(depth) = raw.max_depth {
            config.max_depth = depth;
        }
        config.dispose_timeout = raw.dispose_timeout_ms.map(Duration::from_millis);

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the resolver cannot work with.
    pub fn validate(&self) -> DiResult<()> {
        if self.max_depth == 0 {
            return Err(DiError::Config("max_depth must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn read_env<T: FromStr>(name: &str) -> DiResult<Option<T>> {
    match env::var(name) {
        Ok(value) => parse_integer(name, &value).map(Some),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(DiError::Config(format!("{} is not valid unicode", name)))
        }
    }
}

fn parse_integer<T: FromStr>(name: &str, value: &str) -> DiResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| DiError::Config(format!("{} must be a non-negative integer, got `{}`", name, value)))
}
