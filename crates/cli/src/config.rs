// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `<data_dir>/config.toml`. Every field has a
//! default, so a missing file is valid. `INLINE_REALTIME_URL` and
//! `INLINE_TOKEN` override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::{ConnectionConfig, EngineConfig};

const DATA_DIR_NAME: &str = "inline";
const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "store.db";
const JOURNAL_FILE_NAME: &str = "transactions.jsonl";

/// One hundred years.
const MAX_TRANSACTION_EXPIRY_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Realtime endpoint (`ws://` or `wss://`).
    #[serde(default = "default_realtime_url")]
    pub realtime_url: String,
    /// Auth token sent in `connection_init`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Id of the signed-in user, used as author of optimistic rows.
    #[serde(default)]
    pub user_id: i64,
    /// Max time for connect plus handshake in seconds (default: 10).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Persisted transactions older than this fail at startup (default: 600).
    #[serde(default = "default_transaction_expiry_secs")]
    pub transaction_expiry_secs: u64,
    /// Heartbeat ping interval in milliseconds (default: 30000). 0 = disabled.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Max time to wait for any frame after a ping in milliseconds (default: 10000).
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
}

fn default_realtime_url() -> String {
    "ws://localhost:8000/realtime".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_transaction_expiry_secs() -> u64 {
    600
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    10_000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            realtime_url: default_realtime_url(),
            token: String::new(),
            user_id: 0,
            connect_timeout_secs: default_connect_timeout_secs(),
            transaction_expiry_secs: default_transaction_expiry_secs(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from `data_dir` and applies environment overrides.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with(data_dir, env::realtime_url(), env::token())
    }

    /// Loads `config.toml` only. A missing file yields the defaults.
    pub fn load_file(data_dir: &Path) -> Result<Self> {
        let config = Self::read_file(data_dir)?;
        config.validate()?;
        Ok(config)
    }

    fn load_with(
        data_dir: &Path,
        realtime_url: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let mut config = Self::read_file(data_dir)?;
        config.apply_overrides(realtime_url, token);
        config.validate()?;
        Ok(config)
    }

    fn read_file(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Replaces the URL and token with non-empty overrides.
    pub fn apply_overrides(&mut self, realtime_url: Option<String>, token: Option<String>) {
        if let Some(url) = realtime_url {
            self.realtime_url = url;
        }
        if let Some(token) = token {
            self.token = token;
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.realtime_url.starts_with("ws://") || self.realtime_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "invalid realtime_url '{}'\n  hint: use a ws:// or wss:// URL",
                self.realtime_url
            )));
        }
        if self.expiry().is_none() {
            return Err(Error::Config(format!(
                "transaction_expiry_secs {} is out of range\n  hint: use a value of at most {}",
                self.transaction_expiry_secs, MAX_TRANSACTION_EXPIRY_SECS
            )));
        }
        Ok(())
    }

    fn expiry(&self) -> Option<chrono::Duration> {
        i64::try_from(self.transaction_expiry_secs)
            .ok()
            .filter(|secs| *secs <= MAX_TRANSACTION_EXPIRY_SECS)
            .and_then(chrono::Duration::try_seconds)
    }

    /// Fails unless a token is configured.
    pub fn require_token(&self) -> Result<&str> {
        if self.token.is_empty() {
            return Err(Error::Config(
                "no auth token configured\n  hint: set INLINE_TOKEN or add `token` to config.toml"
                    .to_string(),
            ));
        }
        Ok(&self.token)
    }

    /// Engine and connection settings derived from this config.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            connection: ConnectionConfig {
                url: self.realtime_url.clone(),
                token: self.token.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
                heartbeat_timeout: Duration::from_millis(self.heartbeat_timeout_ms),
            },
            transaction_expiry: self
                .expiry()
                .unwrap_or_else(|| chrono::Duration::seconds(MAX_TRANSACTION_EXPIRY_SECS)),
        }
    }
}

/// Resolves the data directory: explicit flag, then `INLINE_DATA_DIR`,
/// then the platform data dir (`~/.local/share/inline` on Linux).
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env::data_dir() {
        return Ok(dir);
    }
    dirs::data_dir()
        .map(|d| d.join(DATA_DIR_NAME))
        .ok_or_else(|| {
            Error::Config(
                "could not determine a data directory\n  hint: pass --data-dir or set INLINE_DATA_DIR"
                    .to_string(),
            )
        })
}

/// Path of the local store database.
pub fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}

/// Path of the transaction journal.
pub fn journal_path(data_dir: &Path) -> PathBuf {
    data_dir.join(JOURNAL_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
