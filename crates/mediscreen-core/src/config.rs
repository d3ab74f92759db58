//! Core runtime configuration.
//!
//! Resolved once at startup and passed into [`crate::open_core_with_config`]
//! so request handling never reads process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const ENV_DATABASE_PATH: &str = "MEDISCREEN_DATABASE_PATH";
pub const ENV_RAPPORT_URL: &str = "MEDISCREEN_RAPPORT_URL";
pub const ENV_RAPPORT_TIMEOUT_SECS: &str = "MEDISCREEN_RAPPORT_TIMEOUT_SECS";

pub const DEFAULT_DATABASE_PATH: &str = "mediscreen.db";
pub const DEFAULT_RAPPORT_URL: &str = "http://localhost:8080";
pub const DEFAULT_RAPPORT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreConfig {
    database_path: PathBuf,
    rapport_base_url: String,
    rapport_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        database_path: PathBuf,
        rapport_base_url: String,
        rapport_timeout: Duration,
    ) -> ConfigResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                name: ENV_DATABASE_PATH,
                reason: "cannot be empty".into(),
            });
        }

        let url = rapport_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: ENV_RAPPORT_URL,
                reason: format!("expected an http(s) URL, got {:?}", rapport_base_url),
            });
        }

        if rapport_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: ENV_RAPPORT_TIMEOUT_SECS,
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            database_path,
            rapport_base_url: url.to_string(),
            rapport_timeout,
        })
    }

    /// Resolve from the process environment, loading `.env` first if present.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup; unset values take defaults.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(ENV_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let rapport_base_url =
            lookup(ENV_RAPPORT_URL).unwrap_or_else(|| DEFAULT_RAPPORT_URL.to_string());
        let timeout_secs = match lookup(ENV_RAPPORT_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: ENV_RAPPORT_TIMEOUT_SECS,
                reason: e.to_string(),
            })?,
            None => DEFAULT_RAPPORT_TIMEOUT_SECS,
        };

        Self::new(
            database_path,
            rapport_base_url,
            Duration::from_secs(timeout_secs),
        )
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn rapport_base_url(&self) -> &str {
        &self.rapport_base_url
    }

    pub fn rapport_timeout(&self) -> Duration {
        self.rapport_timeout
    }
}
