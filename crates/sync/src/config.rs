// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Stored as `phsync.toml` inside the state directory. Every field has a
//! default, so a missing or empty file yields a working offline engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::network::ReachabilityProbe;
use crate::retry::{ExponentialBackoff, FixedRetry, RetryPolicy};

pub const CONFIG_FILE_NAME: &str = "phsync.toml";
pub const DB_FILE_NAME: &str = "cache.db";
pub const QUEUE_FILE_NAME: &str = "sync_queue.jsonl";

/// Environment variable overriding the default state directory.
pub const STATE_DIR_ENV: &str = "PHSYNC_STATE_DIR";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the cache, the queue and this file.
    #[serde(default = "default_state_dir", skip_serializing)]
    pub state_dir: PathBuf,
    /// Failed attempts after which an action is dropped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial connectivity, before any probe or platform signal arrives.
    #[serde(default)]
    pub start_online: bool,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeConfig>,
}

/// Where confirmed mutations are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket endpoint (`ws://` or `wss://`). Absent means local-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Per-action timeout; an expired call counts as a failure.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub strategy: RetryStrategy,
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
    #[serde(default = "default_true")]
    pub jitter: bool,
}

/// Periodic TCP reachability check feeding the network monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// `host:port` to connect to.
    pub address: String,
    #[serde(default = "default_probe_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_base_ms() -> u64 {
    500
}

fn default_max_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

fn default_probe_interval_ms() -> u64 {
    15_000
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

/// Resolve the state directory: `$PHSYNC_STATE_DIR`, then the platform state
/// dir, then `~/.local/state/phsync`.
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = dirs::state_dir() {
        return dir.join("phsync");
    }
    dirs::home_dir()
        .map(|home| home.join(".local").join("state").join("phsync"))
        .unwrap_or_else(|| PathBuf::from(".phsync"))
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            strategy: RetryStrategy::Fixed,
            base_ms: default_base_ms(),
            max_ms: default_max_ms(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Build the policy this section describes.
    pub fn policy(&self) -> Arc<dyn RetryPolicy> {
        match self.strategy {
            RetryStrategy::Fixed => Arc::new(FixedRetry),
            RetryStrategy::Exponential => Arc::new(
                ExponentialBackoff::new(
                    Duration::from_millis(self.base_ms),
                    Duration::from_millis(self.max_ms),
                )
                .with_jitter(self.jitter),
            ),
        }
    }
}

impl ProbeConfig {
    pub fn probe(&self) -> ReachabilityProbe {
        ReachabilityProbe::new(
            self.address.clone(),
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.timeout_ms),
        )
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::for_dir(default_state_dir())
    }
}

impl EngineConfig {
    /// Defaults rooted at `state_dir`.
    pub fn for_dir(state_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            state_dir: state_dir.into(),
            max_retries: default_max_retries(),
            start_online: false,
            remote: RemoteConfig::default(),
            retry: RetryConfig::default(),
            probe: None,
        }
    }

    /// Load `phsync.toml` from `state_dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load(state_dir: &Path) -> SyncResult<Self> {
        let path = state_dir.join(CONFIG_FILE_NAME);
        let mut config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str::<EngineConfig>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::for_dir(state_dir),
            Err(e) => return Err(e.into()),
        };
        config.state_dir = state_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Write this config to `phsync.toml` in its state directory.
    pub fn save(&self) -> SyncResult<PathBuf> {
        fs::create_dir_all(&self.state_dir)?;
        let path = self.config_path();
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.max_retries == 0 {
            return Err(SyncError::Config("max_retries must be at least 1".into()));
        }
        if let Some(url) = &self.remote.url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(SyncError::Config(format!(
                    "invalid remote URL '{url}': must be ws:// or wss://"
                )));
            }
        }
        if self.retry.strategy == RetryStrategy::Exponential && self.retry.base_ms == 0 {
            return Err(SyncError::Config("retry.base_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join(CONFIG_FILE_NAME)
    }

    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join(DB_FILE_NAME)
    }

    pub fn queue_path(&self) -> PathBuf {
        self.state_dir.join(QUEUE_FILE_NAME)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
