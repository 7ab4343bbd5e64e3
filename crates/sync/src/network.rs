// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity tracking.
//!
//! [`NetworkMonitor`] holds the single online/offline flag. It is fed by the
//! host platform through [`NetworkMonitor::set_online`] or by a
//! [`ReachabilityProbe`]. Only real transitions are reported, so repeated
//! "online" signals never trigger extra sync passes.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What a call to [`NetworkMonitor::set_online`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
    Unchanged,
}

/// Tracks whether the device is believed to be online.
#[derive(Debug)]
pub struct NetworkMonitor {
    tx: watch::Sender<bool>,
}

impl NetworkMonitor {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        NetworkMonitor { tx }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record a connectivity signal and report whether it changed anything.
    ///
    /// The compare and update happen under the channel's lock, so two racing
    /// "online" signals yield exactly one [`Transition::WentOnline`].
    pub fn set_online(&self, online: bool) -> Transition {
        let mut transition = Transition::Unchanged;
        self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            transition = if online {
                Transition::WentOnline
            } else {
                Transition::WentOffline
            };
            true
        });
        transition
    }

    /// Receiver notified on every transition.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Periodically checks that a TCP endpoint accepts connections.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    address: String,
    interval: Duration,
    timeout: Duration,
}

impl ReachabilityProbe {
    pub fn new(address: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        ReachabilityProbe {
            address: address.into(),
            interval,
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// One connection attempt, bounded by the probe timeout.
    pub async fn check(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.address)).await,
            Ok(Ok(_))
        )
    }

    /// Run the probe forever, passing each result to `on_result`.
    ///
    /// The first check runs immediately. Dropping the handle stops the loop.
    pub fn spawn<F>(self, on_result: F) -> ProbeHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reachable = self.check().await;
                tracing::trace!(address = %self.address, reachable, "reachability probe");
                on_result(reachable);
            }
        });
        ProbeHandle { task }
    }
}

/// Owns a running probe; aborts it on drop.
#[derive(Debug)]
pub struct ProbeHandle {
    task: JoinHandle<()>,
}

impl ProbeHandle {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
