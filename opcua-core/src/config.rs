// SPDX-License-Identifier: MPL-2.0

//! Loading, saving and validating client configuration.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error returned from saving or loading a [`Config`].
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration failed [`Config::validate`], with the list of problems found.
    Invalid(Vec<String>),
    /// Reading or writing the file failed.
    Io(std::io::Error),
    /// Failed to serialize or deserialize the config object.
    Yaml(serde_yaml::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

/// Loading, saving and validating a configuration object.
pub trait Config: Serialize {
    /// Save this configuration to `path` as YAML, after validating it.
    fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Err(e) = self.validate() {
            return Err(ConfigError::Invalid(e));
        }
        let s = serde_yaml::to_string(&self)?;
        let mut f = File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Load a configuration object of type `A` from `path`.
    fn load<A>(path: &Path) -> Result<A, ConfigError>
    where
        for<'de> A: Config + Deserialize<'de>,
    {
        let mut f = File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate the configuration, returning a list of problems found.
    fn validate(&self) -> Result<(), Vec<String>>;
}

/// Client-side configuration: timeouts, keep-alive cadence and recovery policy.
///
/// Values mirror the defaults a hand-configured client would use: a one hour
/// session timeout, a keep-alive read every three seconds tolerating five
/// consecutive misses before the session is considered dead, and an
/// exponential reconnect backoff capped at ten seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Requested session timeout, in milliseconds. The server may revise this down.
    pub session_timeout_ms: u32,
    /// Timeout applied to individual service requests, in milliseconds.
    pub request_timeout_ms: u32,
    /// Interval between keep-alive reads of the server's `ServerStatus.State`, in milliseconds.
    pub keep_alive_interval_ms: u32,
    /// Number of consecutive keep-alive failures tolerated before recovery is triggered.
    pub max_keep_alive_failures: u32,
    /// Initial delay before the first reconnect attempt, in milliseconds.
    pub reconnect_initial_delay_ms: u64,
    /// Upper bound on the reconnect backoff delay, in milliseconds.
    pub reconnect_max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: 3_600_000,
            request_timeout_ms: 10_000,
            keep_alive_interval_ms: 3_000,
            max_keep_alive_failures: 5,
            reconnect_initial_delay_ms: 500,
            reconnect_max_delay_ms: 10_000,
        }
    }
}

impl Config for ClientConfig {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.session_timeout_ms == 0 {
            errors.push("session_timeout_ms must be non-zero".to_string());
        }
        if self.keep_alive_interval_ms == 0 {
            errors.push("keep_alive_interval_ms must be non-zero".to_string());
        }
        if self.max_keep_alive_failures == 0 {
            errors.push("max_keep_alive_failures must be non-zero".to_string());
        }
        if self.reconnect_max_delay_ms < self.reconnect_initial_delay_ms {
            errors.push("reconnect_max_delay_ms must be >= reconnect_initial_delay_ms".to_string());
        }
        if self.keep_alive_interval_ms as u64 * 4 > self.session_timeout_ms as u64 {
            errors.push(
                "keep_alive_interval_ms must be <= session_timeout_ms / 4".to_string(),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let mut cfg = ClientConfig::default();
        cfg.session_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backwards_backoff_range_is_invalid() {
        let mut cfg = ClientConfig::default();
        cfg.reconnect_initial_delay_ms = 5_000;
        cfg.reconnect_max_delay_ms = 1_000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn keep_alive_interval_over_a_quarter_of_session_timeout_is_invalid() {
        let mut cfg = ClientConfig::default();
        cfg.session_timeout_ms = 1_000;
        cfg.keep_alive_interval_ms = 300;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn keep_alive_interval_at_exactly_a_quarter_is_valid() {
        let mut cfg = ClientConfig::default();
        cfg.session_timeout_ms = 1_000;
        cfg.keep_alive_interval_ms = 250;
        assert!(cfg.validate().is_ok());
    }
}
