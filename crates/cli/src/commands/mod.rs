// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod enqueue;
pub mod init;
pub mod status;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use ph_sync::config::CONFIG_FILE_NAME;
use ph_sync::{Disconnected, EngineConfig, SyncEngine};
use serde_json::Value;

use crate::error::{Error, Result};

/// Load the config of an initialized state directory.
pub fn load_config(state_dir: &Path) -> Result<EngineConfig> {
    if !state_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::NotInitialized(state_dir.display().to_string()));
    }
    Ok(EngineConfig::load(state_dir)?)
}

/// Open the engine for local commands. No remote is attached.
pub fn open_engine(state_dir: &Path) -> Result<SyncEngine> {
    let config = load_config(state_dir)?;
    Ok(SyncEngine::initialize(&config, Arc::new(Disconnected))?)
}

pub fn parse_json(what: &'static str, input: &str) -> Result<Value> {
    serde_json::from_str(input).map_err(|source| Error::InvalidJson { what, source })
}

/// Index values are JSON when they parse as JSON, plain strings otherwise,
/// so `--value true` matches a boolean and `--value Lisbon` a string.
pub fn parse_index_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
