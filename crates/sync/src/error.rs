// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the sync runtime.

use thiserror::Error;

use crate::remote::RemoteError;
use crate::report::ErrorCode;

/// Errors surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("storage error: {0}")]
    Storage(#[from] ph_core::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}

impl SyncError {
    /// The reporting code for failures that must be surfaced as fatal.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            SyncError::Storage(e) if e.is_storage() => Some(ErrorCode::FatalStorageError),
            SyncError::Io(_) => Some(ErrorCode::FatalStorageError),
            _ => None,
        }
    }
}

/// Result type for sync runtime operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
