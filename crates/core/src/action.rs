// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending mutations waiting for remote confirmation.
//!
//! A [`QueuedAction`] is the unit stored in the mutation queue and handed to
//! the remote collaborator. The payload is opaque to the engine; only the
//! remote knows how to address the record it touches.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::ActionId;
use crate::error::{Error, Result};

/// The kind of mutation an action carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "CREATE",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(ActionKind::Create),
            "UPDATE" => Ok(ActionKind::Update),
            "DELETE" => Ok(ActionKind::Delete),
            _ => Err(Error::InvalidActionKind(s.to_string())),
        }
    }
}

/// One pending mutation intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    /// Unique id, assigned at enqueue time. Id order is enqueue order.
    pub id: ActionId,
    pub kind: ActionKind,
    /// Name of the collection the mutation targets.
    pub resource: String,
    /// Opaque data for the remote call.
    pub payload: Value,
    pub enqueued_at: DateTime<Utc>,
    /// Failed executions so far.
    #[serde(default)]
    pub retry_count: u32,
    /// Failed executions after which the action is dropped.
    pub max_retries: u32,
    /// Earliest time the next attempt may run (set by backoff policies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
}

impl QueuedAction {
    /// Creates a fresh action with no failed attempts.
    pub fn new(
        id: ActionId,
        kind: ActionKind,
        resource: impl Into<String>,
        payload: Value,
        max_retries: u32,
    ) -> Self {
        QueuedAction {
            id,
            kind,
            resource: resource.into(),
            payload,
            enqueued_at: id.timestamp(),
            retry_count: 0,
            max_retries,
            not_before: None,
        }
    }

    /// True once the retry budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// True if a backoff delay still holds this action back at `now`.
    pub fn is_deferred(&self, now: DateTime<Utc>) -> bool {
        self.not_before.is_some_and(|t| t > now)
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
