// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error reporting for failures the engine absorbs.
//!
//! Retry-exhausted actions and failed passes never surface as `Err` to the
//! caller of `enqueue`. They are recorded in the published status and handed
//! to an [`ErrorReporter`], the seam for an external crash/error service.

use std::fmt;

use chrono::{DateTime, Utc};
use ph_core::ActionId;
use serde::Serialize;

/// Stable codes for reported failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The storage engine failed; durability cannot be guaranteed.
    FatalStorageError,
    /// An action exhausted its retry budget and was dropped.
    SyncActionMaxRetries,
    /// A pass could not persist its residual queue.
    SyncPassFailed,
    /// A confirmed mutation could not be written to the local cache.
    SyncApplyFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FatalStorageError => "FATAL_STORAGE_ERROR",
            ErrorCode::SyncActionMaxRetries => "SYNC_ACTION_MAX_RETRIES",
            ErrorCode::SyncPassFailed => "SYNC_PASS_FAILED",
            ErrorCode::SyncApplyFailed => "SYNC_APPLY_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure recorded in `last_error` and sent to the reporter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_id: Option<ActionId>,
    pub at: DateTime<Utc>,
}

impl ReportedError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ReportedError {
            code,
            message: message.into(),
            action_id: None,
            at: Utc::now(),
        }
    }

    pub fn for_action(mut self, id: ActionId) -> Self {
        self.action_id = Some(id);
        self
    }
}

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action_id {
            Some(id) => write!(f, "{}: {} (action {id})", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Receives failures the engine keeps running through.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &ReportedError);
}

/// Default reporter: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &ReportedError) {
        match error.action_id {
            Some(id) => tracing::error!(code = %error.code, action = %id, "{}", error.message),
            None => tracing::error!(code = %error.code, "{}", error.message),
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
