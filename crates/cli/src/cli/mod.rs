// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "phsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first record cache and mutation queue for PropertyHub clients")]
#[command(after_help = "\
Get started:
  phsync init --remote wss://sync.example.com/ws
  phsync enqueue CREATE bookings '{\"id\":\"b-1\",\"propertyId\":\"p-1\"}'
  phsync status
  phsync sync")]
pub struct Cli {
    /// State directory (default: $PHSYNC_STATE_DIR or the platform state dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the state directory, config, cache and queue
    Init {
        /// WebSocket endpoint of the sync server
        #[arg(long, value_name = "URL")]
        remote: Option<String>,

        /// Failed attempts before an action is dropped
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_retries: Option<u32>,
    },

    /// Show sync status
    Status {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Queue a mutation for the server
    #[command(after_help = "\
Examples:
  phsync enqueue CREATE bookings '{\"id\":\"b-1\",\"propertyId\":\"p-1\"}'
  phsync enqueue delete notifications '{\"id\":\"n-4\"}'")]
    Enqueue {
        /// CREATE, UPDATE or DELETE
        kind: String,

        /// Resource the mutation targets
        #[arg(value_parser = non_empty_string)]
        resource: String,

        /// Mutation payload as JSON
        payload: String,
    },

    /// List queued actions in execution order
    Pending {
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print one cached record
    Get { collection: String, key: String },

    /// Print cached records, one JSON document per line
    List {
        collection: String,

        /// Secondary index to filter on
        #[arg(long, requires = "value")]
        index: Option<String>,

        /// Index value (parsed as JSON when possible)
        #[arg(long, requires = "index")]
        value: Option<String>,
    },

    /// Write a record into the cache
    Put {
        collection: String,

        /// Record as a JSON object
        record: String,
    },

    /// Print the number of cached records
    CacheSize,

    /// Remove every cached record (queued actions are kept)
    ClearCache,

    /// Run one sync pass against the configured remote
    Sync,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
