// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable FIFO log of pending mutations.
//!
//! Uses JSONL for durability: enqueue appends one line and fsyncs before
//! returning, so an action acknowledged to the caller survives a crash.
//! Removals and retry bookkeeping rewrite the whole log atomically.
//!
//! The in-memory mirror is only updated after the durable write succeeds,
//! so a failed write leaves the queue exactly as it was.

use std::collections::hash_map::DefaultHasher;
use std::fs::OpenOptions;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::action::{ActionKind, QueuedAction};
use crate::clock::{ActionClock, ActionId};
use crate::error::Result;
use crate::jsonl;

/// Outcome of [`MutationQueue::requeue_with_increment`].
#[derive(Debug, Clone, PartialEq)]
pub enum Requeue {
    /// The action stays queued with the given retry count.
    Retained(u32),
    /// The retry budget is spent; the action was removed from the log.
    Dropped(QueuedAction),
    /// No action with that id is queued.
    Missing,
}

/// Ordered, durable log of [`QueuedAction`]s.
pub struct MutationQueue {
    path: PathBuf,
    actions: Vec<QueuedAction>,
    clock: ActionClock,
    max_retries: u32,
}

impl MutationQueue {
    /// Create or open a queue at the given path.
    ///
    /// The node id stamped into new action ids is derived from the path.
    pub fn open(path: &Path, max_retries: u32) -> Result<Self> {
        Self::open_with_clock(path, max_retries, ActionClock::new(node_id_for(path)))
    }

    /// Create or open a queue with a custom id clock.
    pub fn open_with_clock(path: &Path, max_retries: u32, clock: ActionClock) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Ensure the file exists (create if not)
        OpenOptions::new().create(true).append(true).open(path)?;

        let actions: Vec<QueuedAction> = jsonl::read_repairing(path)?;
        for action in &actions {
            clock.observe(&action.id);
        }

        Ok(MutationQueue {
            path: path.to_path_buf(),
            actions,
            clock,
            max_retries,
        })
    }

    /// Appends a new action and persists it before returning.
    ///
    /// Returns the number of pending actions after the append.
    pub fn enqueue(&mut self, kind: ActionKind, resource: &str, payload: Value) -> Result<usize> {
        let action = QueuedAction::new(
            self.clock.next_id(),
            kind,
            resource,
            payload,
            self.max_retries,
        );
        jsonl::append(&self.path, &action)?;
        self.actions.push(action);
        Ok(self.actions.len())
    }

    /// All pending actions in enqueue order.
    pub fn snapshot(&self) -> Vec<QueuedAction> {
        self.actions.clone()
    }

    /// Looks up a pending action.
    pub fn get(&self, id: &ActionId) -> Option<&QueuedAction> {
        self.actions.iter().find(|a| a.id == *id)
    }

    /// Removes a confirmed action. Returns false if it was not queued.
    pub fn remove(&mut self, id: &ActionId) -> Result<bool> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };

        let mut remaining = self.actions.clone();
        remaining.remove(idx);
        self.commit(remaining)?;
        Ok(true)
    }

    /// Records one failed execution.
    ///
    /// Once the retry count reaches the action's budget the action is
    /// dropped from the log and handed back to the caller for reporting.
    pub fn requeue_with_increment(&mut self, id: &ActionId) -> Result<Requeue> {
        let Some(idx) = self.position(id) else {
            return Ok(Requeue::Missing);
        };

        let mut updated = self.actions.clone();
        updated[idx].retry_count += 1;

        if updated[idx].is_exhausted() {
            let dropped = updated.remove(idx);
            self.commit(updated)?;
            Ok(Requeue::Dropped(dropped))
        } else {
            let count = updated[idx].retry_count;
            self.commit(updated)?;
            Ok(Requeue::Retained(count))
        }
    }

    /// Atomically swaps the whole log for the given ordered list.
    pub fn replace(&mut self, actions: Vec<QueuedAction>) -> Result<()> {
        self.commit(actions)
    }

    /// Get the number of pending actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Retry budget given to newly enqueued actions.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the path to the queue file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn position(&self, id: &ActionId) -> Option<usize> {
        self.actions.iter().position(|a| a.id == *id)
    }

    fn commit(&mut self, actions: Vec<QueuedAction>) -> Result<()> {
        jsonl::write_atomic(&self.path, &actions)?;
        self.actions = actions;
        Ok(())
    }
}

/// Derives a stable node id from the queue location.
fn node_id_for(path: &Path) -> u32 {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() & 0xFFFF_FFFF) as u32
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
