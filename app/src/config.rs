//! Configuration management for the Railbook application.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the booking API (`RAILBOOK_API_BASE_URL`)
    pub api_base_url: String,
    /// Per-request timeout (`RAILBOOK_API_TIMEOUT_SECS`)
    pub api_timeout: Duration,
    /// File backing durable storage (`RAILBOOK_STORAGE_PATH`)
    pub storage_path: PathBuf,
    /// Default notification lifetime (`RAILBOOK_NOTIFICATION_DURATION_MS`)
    pub notification_duration: Duration,
    /// Ignore search responses overtaken by a newer search (`RAILBOOK_DISCARD_STALE_SEARCHES`)
    pub discard_stale_searches: bool,
    /// Graceful shutdown budget per store (`RAILBOOK_SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_timeout: Duration::from_secs(30),
            storage_path: PathBuf::from(".railbook/storage.json"),
            notification_duration: Duration::from_millis(4000),
            discard_stale_searches: true,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable is set
    /// to something unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            api_base_url: lookup("RAILBOOK_API_BASE_URL")
                .map_or(defaults.api_base_url, |url| url.trim_end_matches('/').to_string()),
            api_timeout: parse(&lookup, "RAILBOOK_API_TIMEOUT_SECS")?
                .map_or(defaults.api_timeout, Duration::from_secs),
            storage_path: lookup("RAILBOOK_STORAGE_PATH").map_or(defaults.storage_path, PathBuf::from),
            notification_duration: parse(&lookup, "RAILBOOK_NOTIFICATION_DURATION_MS")?
                .map_or(defaults.notification_duration, Duration::from_millis),
            discard_stale_searches: parse(&lookup, "RAILBOOK_DISCARD_STALE_SEARCHES")?
                .unwrap_or(defaults.discard_stale_searches),
            shutdown_timeout: parse(&lookup, "RAILBOOK_SHUTDOWN_TIMEOUT_SECS")?
                .map_or(defaults.shutdown_timeout, Duration::from_secs),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|error: T::Err| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: error.to_string(),
            })
        })
        .transpose()
}
