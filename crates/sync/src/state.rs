// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! State shared by the engine facade and the orchestrator.

use std::sync::{Mutex, MutexGuard};

use ph_core::{MutationQueue, Store};

use crate::network::NetworkMonitor;
use crate::status::{StatusPublisher, SyncStatus};

/// The cache, the queue, connectivity and status of one engine.
///
/// Both mutexes are std mutexes and are never held across an `.await`.
/// When a status update needs the queue, the status lock is taken first.
pub(crate) struct Shared {
    pub(crate) store: Mutex<Store>,
    pub(crate) queue: Mutex<MutationQueue>,
    pub(crate) network: NetworkMonitor,
    pub(crate) status: StatusPublisher,
}

impl Shared {
    pub(crate) fn new(store: Store, queue: MutationQueue, online: bool) -> Self {
        let status = StatusPublisher::new(SyncStatus {
            is_online: online,
            pending_actions: queue.len(),
            ..SyncStatus::default()
        });
        Shared {
            store: Mutex::new(store),
            queue: Mutex::new(queue),
            network: NetworkMonitor::new(online),
            status,
        }
    }

    /// Publish the queue length as `pending_actions`.
    pub(crate) fn publish_pending(&self) -> SyncStatus {
        self.status
            .update(|s| s.pending_actions = lock(&self.queue).len())
    }
}

/// Lock a std mutex, recovering the data from a poisoned lock.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
