// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::sync::Arc;

use ph_sync::{PassOutcome, SkipReason, SyncEngine, WebSocketRemote};
use tracing::debug;

use super::load_config;
use crate::error::{Error, Result};

pub fn run(state_dir: &Path) -> Result<()> {
    let config = load_config(state_dir)?;
    let url = config.remote.url.clone().ok_or(Error::NoRemote)?;
    let engine = SyncEngine::initialize(&config, Arc::new(WebSocketRemote::new(url)))?;

    let rt = tokio::runtime::Runtime::new()?;
    let online = match &config.probe {
        Some(probe) => rt.block_on(probe.probe().check()),
        None => true,
    };
    debug!(online, "connectivity before sync");

    // Outside the runtime the online transition does not spawn its own pass,
    // so the pass below is the only one.
    engine.set_online(online);
    match rt.block_on(engine.sync_now()) {
        PassOutcome::Completed(report) => {
            println!("Sync complete: {report}");
            if let Some(error) = engine.status().last_error {
                println!("Last error: {error}");
            }
            println!("{} pending", engine.pending_actions());
            Ok(())
        }
        PassOutcome::Skipped(SkipReason::AlreadySyncing) => {
            println!("Sync skipped: another pass is running");
            Ok(())
        }
        PassOutcome::Skipped(SkipReason::Offline) => {
            println!("Sync skipped: offline");
            Ok(())
        }
        PassOutcome::Failed { error, .. } => Err(Error::SyncFailed(error.to_string())),
    }
}
