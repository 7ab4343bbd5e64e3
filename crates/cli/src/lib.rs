// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! phsync - command-line access to a PropertyHub sync state directory.
//!
//! Inspect and edit the record cache, queue mutations and run sync passes
//! against the configured remote. Each invocation opens the engine, runs one
//! command and exits.

mod cli;
mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command, OutputFormat};
pub use error::{Error, Result};

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let state_dir = cli
        .state_dir
        .unwrap_or_else(ph_sync::config::default_state_dir);
    tracing::debug!(state_dir = %state_dir.display(), "running command");
    match cli.command {
        Command::Init {
            remote,
            max_retries,
        } => commands::init::run(&state_dir, remote, max_retries),
        Command::Status { output } => commands::status::run(&state_dir, output),
        Command::Enqueue {
            kind,
            resource,
            payload,
        } => commands::enqueue::run(&state_dir, &kind, &resource, &payload),
        Command::Pending { output } => commands::enqueue::pending(&state_dir, output),
        Command::Get { collection, key } => commands::cache::get(&state_dir, &collection, &key),
        Command::List {
            collection,
            index,
            value,
        } => commands::cache::list(&state_dir, &collection, index.zip(value)),
        Command::Put { collection, record } => {
            commands::cache::put(&state_dir, &collection, &record)
        }
        Command::CacheSize => commands::cache::size(&state_dir),
        Command::ClearCache => commands::cache::clear(&state_dir),
        Command::Sync => commands::sync::run(&state_dir),
    }
}
