// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ph-core operations.

use thiserror::Error;

/// All possible errors that can occur in ph-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown collection: '{0}'\n  hint: collections must be declared when the store is opened")]
    UnknownCollection(String),

    #[error("unknown index '{index}' on collection '{collection}'")]
    UnknownIndex { collection: String, index: String },

    #[error("record in '{collection}' has no usable key field '{key_path}'")]
    MissingKey {
        collection: String,
        key_path: String,
    },

    #[error("record must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("invalid action kind: '{0}'\n  hint: valid kinds are: CREATE, UPDATE, DELETE")]
    InvalidActionKind(String),

    #[error("invalid action id: {0}")]
    InvalidActionId(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Returns true if this error comes from the storage layer itself
    /// (as opposed to a caller mistake such as an unknown collection).
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Io(_) | Error::CorruptedData(_)
        )
    }
}

/// A specialized Result type for ph-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
