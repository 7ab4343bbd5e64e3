// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket messages exchanged with the remote mutation service.
//!
//! The protocol is request/response per action:
//! - Client sends `execute` carrying one queued action
//! - Server answers `confirmed` or `rejected` for that action id
//!
//! Action ids are client-generated and sent with every attempt, so a server
//! can recognise a retried action it has already applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::QueuedAction;
use crate::clock::ActionId;

/// What the remote did with a confirmed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "value", rename_all = "snake_case")]
pub enum Confirmation {
    /// Applied; nothing to cache locally.
    Ack,
    /// Applied; this is the authoritative record to cache.
    Record(Value),
    /// Applied; the record with this key no longer exists.
    Deleted(String),
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask the server to execute one mutation.
    Execute { action: QueuedAction },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The action was applied.
    Confirmed {
        id: ActionId,
        confirmation: Confirmation,
    },

    /// The action was refused; the client may retry it.
    Rejected { id: ActionId, reason: String },

    /// Error not tied to a specific action.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates an Execute message.
    pub fn execute(action: QueuedAction) -> Self {
        ClientMessage::Execute { action }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a Confirmed message.
    pub fn confirmed(id: ActionId, confirmation: Confirmation) -> Self {
        ServerMessage::Confirmed { id, confirmation }
    }

    /// Creates a Rejected message.
    pub fn rejected(id: ActionId, reason: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            id,
            reason: reason.into(),
        }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// The action this message answers, if any.
    pub fn action_id(&self) -> Option<ActionId> {
        match self {
            ServerMessage::Confirmed { id, .. } | ServerMessage::Rejected { id, .. } => Some(*id),
            ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
