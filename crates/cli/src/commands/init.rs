// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::sync::Arc;

use ph_sync::{Disconnected, EngineConfig, SyncEngine};

use crate::error::{Error, Result};

pub fn run(state_dir: &Path, remote: Option<String>, max_retries: Option<u32>) -> Result<()> {
    let mut config = EngineConfig::for_dir(state_dir);
    if config.config_path().exists() {
        return Err(Error::AlreadyInitialized(state_dir.display().to_string()));
    }
    config.remote.url = remote;
    if let Some(n) = max_retries {
        config.max_retries = n;
    }
    config.validate()?;
    config.save()?;

    // Opening the engine creates the cache database and the queue file.
    SyncEngine::initialize(&config, Arc::new(Disconnected))?;

    println!("Initialized sync state at {}", state_dir.display());
    if let Some(url) = &config.remote.url {
        println!("Remote: {url}");
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
