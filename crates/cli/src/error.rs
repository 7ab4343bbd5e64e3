// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors reported by `phsync` commands.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'phsync init' first (state dir: {0})")]
    NotInitialized(String),

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("invalid {what} JSON: {source}")]
    InvalidJson {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("record not found: {collection}/{key}")]
    RecordNotFound { collection: String, key: String },

    #[error("no remote configured\n  hint: set [remote] url in phsync.toml or run 'phsync init --remote <ws-url>'")]
    NoRemote,

    #[error("sync failed: {0}")]
    SyncFailed(String),

    #[error(transparent)]
    Sync(#[from] ph_sync::SyncError),

    #[error(transparent)]
    Core(#[from] ph_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
