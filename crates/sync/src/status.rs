// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Observable sync status.
//!
//! Listeners are called synchronously on the thread that changed the status,
//! outside the publisher's lock, so a listener may read [`StatusPublisher::current`]
//! or call back into the engine. Each snapshot carries a version; a listener
//! skips any snapshot older than one it has already been handed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::report::ReportedError;

/// Snapshot of the engine's sync state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    /// End of the last pass that completed.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Queue length.
    pub pending_actions: usize,
    pub sync_in_progress: bool,
    pub last_error: Option<ReportedError>,
}

type Callback = Box<dyn Fn(&SyncStatus) + Send + Sync>;

struct Listener {
    id: u64,
    seen: AtomicU64,
    callback: Callback,
}

impl Listener {
    fn deliver(&self, version: u64, status: &SyncStatus) {
        if self.seen.fetch_max(version, Ordering::AcqRel) < version {
            (self.callback)(status);
        }
    }
}

struct Inner {
    status: SyncStatus,
    version: u64,
    listeners: Vec<Arc<Listener>>,
    next_id: u64,
}

/// Holds the current [`SyncStatus`] and fans changes out to listeners.
pub struct StatusPublisher {
    inner: Arc<Mutex<Inner>>,
}

impl StatusPublisher {
    pub fn new(initial: SyncStatus) -> Self {
        StatusPublisher {
            inner: Arc::new(Mutex::new(Inner {
                status: initial,
                version: 1,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn current(&self) -> SyncStatus {
        lock(&self.inner).status.clone()
    }

    /// Register a listener. It is called immediately with the current status
    /// and again after every change until the returned handle is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        let (listener, version, status) = {
            let mut inner = lock(&self.inner);
            let listener = Arc::new(Listener {
                id: inner.next_id,
                seen: AtomicU64::new(0),
                callback: Box::new(callback),
            });
            inner.next_id += 1;
            inner.listeners.push(Arc::clone(&listener));
            (listener, inner.version, inner.status.clone())
        };
        listener.deliver(version, &status);
        Subscription {
            inner: Arc::downgrade(&self.inner),
            id: listener.id,
        }
    }

    /// Apply `change` and notify listeners if the status actually changed.
    /// Returns the resulting status.
    pub fn update<F>(&self, change: F) -> SyncStatus
    where
        F: FnOnce(&mut SyncStatus),
    {
        let (version, status, listeners) = {
            let mut inner = lock(&self.inner);
            let before = inner.status.clone();
            change(&mut inner.status);
            if inner.status == before {
                return before;
            }
            inner.version += 1;
            (inner.version, inner.status.clone(), inner.listeners.clone())
        };
        for listener in &listeners {
            listener.deliver(version, &status);
        }
        status
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

impl fmt::Debug for StatusPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("StatusPublisher")
            .field("status", &inner.status)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Keeps a status listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    inner: Weak<Mutex<Inner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).listeners.retain(|l| l.id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
