//! Runtime configuration.
//!
//! Loaded from the process environment (after an optional `.env` file):
//!
//! | variable                   | required | default |
//! |----------------------------|----------|---------|
//! | `DATABASE_URL`             | yes      |         |
//! | `DATABASE_MAX_CONNECTIONS` | no       | 16      |
//! | `CRYPTO_KEY`               | yes      |         |
//!
//! `CRYPTO_KEY` is the 16-byte AES key used for the `password` column.

use crate::codec::KEY_LEN;
use std::env;
use thiserror::Error;

/// Default pool size.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: usize,
    pub secret_key: Vec<u8>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn new(
        database_url: impl Into<String>,
        secret_key: impl Into<Vec<u8>>,
    ) -> ConfigResult<Self> {
        let secret_key = secret_key.into();
        check_key(&secret_key)?;
        Ok(Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            secret_key,
        })
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> ConfigResult<Self> {
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }
        self.max_connections = max_connections;
        Ok(self)
    }

    /// Load from the environment, reading `.env` first if one exists.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let secret_key = lookup("CRYPTO_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("CRYPTO_KEY"))?;

        let config = Self::new(database_url, secret_key.into_bytes())?;
        match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => {
                let n = raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    reason: e.to_string(),
                })?;
                config.with_max_connections(n)
            }
            None => Ok(config),
        }
    }
}

fn check_key(key: &[u8]) -> ConfigResult<()> {
    if key.len() != KEY_LEN {
        return Err(ConfigError::Invalid {
            name: "CRYPTO_KEY",
            reason: format!("expected {KEY_LEN} bytes, got {}", key.len()),
        });
    }
    Ok(())
}
