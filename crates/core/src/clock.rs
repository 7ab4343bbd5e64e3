// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic action identifiers.
//!
//! Every queued action gets an [`ActionId`] stamped by an [`ActionClock`]:
//! wall clock milliseconds plus a logical counter plus a node id. Ids from
//! one clock are strictly increasing, so sorting by id reproduces enqueue
//! order even when the wall clock stalls or steps backwards.
//!
//! Format: `{wall_ms}-{counter}-{node}`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Identifier of a queued action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId {
    /// Wall clock time in milliseconds since Unix epoch.
    pub wall_ms: u64,
    /// Logical counter for ids minted within the same millisecond.
    pub counter: u32,
    /// Node identifier, distinguishing engines that share a remote.
    pub node: u32,
}

impl ActionId {
    /// Creates an id from its components.
    pub fn new(wall_ms: u64, counter: u32, node: u32) -> Self {
        ActionId {
            wall_ms,
            counter,
            node,
        }
    }

    /// The wall clock component as a UTC timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        i64::try_from(self.wall_ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_default()
    }
}

impl Ord for ActionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wall_ms
            .cmp(&other.wall_ms)
            .then_with(|| self.counter.cmp(&other.counter))
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for ActionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.wall_ms, self.counter, self.node)
    }
}

impl FromStr for ActionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('-');
        let (Some(wall), Some(counter), Some(node), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidActionId(format!(
                "expected 'wall_ms-counter-node', got '{s}'"
            )));
        };

        let wall_ms = wall
            .parse::<u64>()
            .map_err(|_| Error::InvalidActionId(format!("invalid wall_ms '{wall}' in '{s}'")))?;
        let counter = counter
            .parse::<u32>()
            .map_err(|_| Error::InvalidActionId(format!("invalid counter '{counter}' in '{s}'")))?;
        let node = node
            .parse::<u32>()
            .map_err(|_| Error::InvalidActionId(format!("invalid node '{node}' in '{s}'")))?;

        Ok(ActionId::new(wall_ms, counter, node))
    }
}

// Serialized as the display string so queue lines stay greppable.
impl Serialize for ActionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of wall clock time.
///
/// Injectable so tests can control time.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Mints strictly increasing [`ActionId`]s.
pub struct ActionClock {
    source: Box<dyn ClockSource>,
    node: u32,
    last: Mutex<(u64, u32)>,
}

impl ActionClock {
    /// Creates a clock over the system time.
    pub fn new(node: u32) -> Self {
        Self::with_source(Box::new(SystemClock), node)
    }

    /// Creates a clock over a custom time source.
    pub fn with_source(source: Box<dyn ClockSource>, node: u32) -> Self {
        ActionClock {
            source,
            node,
            last: Mutex::new((0, 0)),
        }
    }

    /// Returns the node id stamped into every id.
    pub fn node(&self) -> u32 {
        self.node
    }

    /// Current wall time of the underlying source.
    pub fn now_ms(&self) -> u64 {
        self.source.now_ms()
    }

    /// Mints the next id.
    pub fn next_id(&self) -> ActionId {
        let physical = self.source.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let (wall_ms, counter) = if physical > last.0 {
            (physical, 0)
        } else {
            (last.0, last.1 + 1)
        };
        *last = (wall_ms, counter);

        ActionId::new(wall_ms, counter, self.node)
    }

    /// Advances the clock past an id loaded from durable state.
    ///
    /// Called for every persisted action on open so ids minted after a
    /// restart sort after everything already in the queue.
    pub fn observe(&self, id: &ActionId) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if (id.wall_ms, id.counter) > *last {
            *last = (id.wall_ms, id.counter);
        }
    }
}

impl fmt::Debug for ActionClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionClock")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
