// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The consumer-facing sync engine.
//!
//! A [`SyncEngine`] owns one cache, one mutation queue and one orchestrator.
//! It is cheap to clone; clones share state. Construct it with
//! [`SyncEngine::initialize`] from an [`EngineConfig`], or with
//! [`SyncEngine::builder`] when embedding or testing.

use std::path::PathBuf;
use std::sync::Arc;

use ph_core::{ActionClock, ActionKind, CollectionSpec, MutationQueue, QueuedAction, Store};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::network::{ProbeHandle, ReachabilityProbe, Transition};
use crate::orchestrator::{PassOutcome, SyncOrchestrator};
use crate::remote::{with_timeout, Remote};
use crate::report::{ErrorCode, ErrorReporter, ReportedError, TracingReporter};
use crate::retry::{FixedRetry, RetryPolicy};
use crate::state::{lock, Shared};
use crate::status::{Subscription, SyncStatus};

/// Offline-first sync engine handle.
#[derive(Clone)]
pub struct SyncEngine {
    orchestrator: Arc<SyncOrchestrator>,
}

impl SyncEngine {
    /// Open the cache and queue described by `config` and start syncing
    /// through `remote` if the engine starts online.
    ///
    /// Storage failures here are fatal: they are reported with
    /// `FATAL_STORAGE_ERROR` and returned.
    pub fn initialize(config: &EngineConfig, remote: Arc<dyn Remote>) -> SyncResult<Self> {
        config.validate()?;
        let reporter: Arc<dyn ErrorReporter> = Arc::new(TracingReporter);
        let opened = Store::open(&config.db_path(), CollectionSpec::defaults())
            .and_then(|store| {
                MutationQueue::open(&config.queue_path(), config.max_retries)
                    .map(|queue| (store, queue))
            });
        let (store, queue) = match opened {
            Ok(parts) => parts,
            Err(e) => {
                let err = SyncError::from(e);
                if let Some(code) = err.code() {
                    reporter.report(&ReportedError::new(code, err.to_string()));
                }
                return Err(err);
            }
        };
        info!(
            state_dir = %config.state_dir.display(),
            pending = queue.len(),
            "sync engine initialized"
        );

        let remote: Arc<dyn Remote> = Arc::new(with_timeout(remote, config.remote.timeout()));
        SyncEngine::builder()
            .store(store)
            .queue(queue)
            .online(config.start_online)
            .remote(remote)
            .retry_policy(config.retry.policy())
            .reporter(reporter)
            .build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    fn shared(&self) -> &Shared {
        self.orchestrator.shared()
    }

    /// Report storage-layer failures as fatal before handing them back.
    fn checked<T>(&self, result: ph_core::Result<T>) -> SyncResult<T> {
        result.map_err(|e| {
            if e.is_storage() {
                self.orchestrator
                    .reporter()
                    .report(&ReportedError::new(ErrorCode::FatalStorageError, e.to_string()));
            }
            SyncError::from(e)
        })
    }

    /// Durably queue a mutation and return the number of pending actions.
    ///
    /// When online a background pass is requested.
    pub fn enqueue(&self, kind: ActionKind, resource: &str, payload: Value) -> SyncResult<usize> {
        let result = lock(&self.shared().queue).enqueue(kind, resource, payload);
        let pending = self.checked(result)?;
        debug!(%kind, resource, pending, "action enqueued");
        self.shared().publish_pending();
        if self.shared().network.is_online() {
            self.request_sync();
        }
        Ok(pending)
    }

    pub fn get(&self, collection: &str, key: &str) -> SyncResult<Option<Value>> {
        let result = lock(&self.shared().store).get(collection, key);
        self.checked(result)
    }

    pub fn get_all(&self, collection: &str) -> SyncResult<Vec<Value>> {
        let result = lock(&self.shared().store).get_all(collection);
        self.checked(result)
    }

    pub fn get_all_by_index(
        &self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> SyncResult<Vec<Value>> {
        let result = lock(&self.shared().store).get_all_by_index(collection, index, value);
        self.checked(result)
    }

    /// Write a record into the cache. Returns its key.
    pub fn put(&self, collection: &str, record: &Value) -> SyncResult<String> {
        let result = lock(&self.shared().store).put(collection, record);
        self.checked(result)
    }

    pub fn delete(&self, collection: &str, key: &str) -> SyncResult<bool> {
        let result = lock(&self.shared().store).delete(collection, key);
        self.checked(result)
    }

    /// Remove every cached record. Queued actions are kept.
    pub fn clear_cache(&self) -> SyncResult<usize> {
        let result = lock(&self.shared().store).clear_all();
        let removed = self.checked(result)?;
        info!(removed, "cache cleared");
        Ok(removed)
    }

    /// Number of cached records across all collections.
    pub fn cache_size(&self) -> SyncResult<usize> {
        let result = lock(&self.shared().store).total_count();
        self.checked(result)
    }

    pub fn pending_actions(&self) -> usize {
        lock(&self.shared().queue).len()
    }

    pub fn pending(&self) -> Vec<QueuedAction> {
        lock(&self.shared().queue).snapshot()
    }

    pub fn status(&self) -> SyncStatus {
        self.shared().status.current()
    }

    /// Listen to status changes. See [`crate::status::StatusPublisher::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.shared().status.subscribe(callback)
    }

    pub fn is_online(&self) -> bool {
        self.shared().network.is_online()
    }

    /// Feed a connectivity signal. Going online requests a pass.
    pub fn set_online(&self, online: bool) -> Transition {
        let transition = self.shared().network.set_online(online);
        match transition {
            Transition::WentOnline => {
                info!("network online");
                self.shared().status.update(|s| s.is_online = true);
                self.request_sync();
            }
            Transition::WentOffline => {
                info!("network offline");
                self.shared().status.update(|s| s.is_online = false);
            }
            Transition::Unchanged => {}
        }
        transition
    }

    /// Connectivity transitions as a watch channel.
    pub fn network(&self) -> watch::Receiver<bool> {
        self.shared().network.watch()
    }

    /// Start a pass in the background.
    ///
    /// Returns `None` when called outside a Tokio runtime; the pass then waits
    /// for the next trigger.
    pub fn request_sync(&self) -> Option<JoinHandle<PassOutcome>> {
        let Ok(handle) = Handle::try_current() else {
            debug!("no async runtime, sync request deferred");
            return None;
        };
        let orchestrator = Arc::clone(&self.orchestrator);
        Some(handle.spawn(async move { orchestrator.run_pass().await }))
    }

    /// Run a pass and wait for it.
    pub async fn sync_now(&self) -> PassOutcome {
        self.orchestrator.run_pass().await
    }

    /// Drive connectivity from a reachability probe.
    pub fn spawn_probe(&self, probe: ReachabilityProbe) -> ProbeHandle {
        let engine = self.clone();
        probe.spawn(move |reachable| {
            engine.set_online(reachable);
        })
    }

    /// Start the probe described by the `[probe]` section of `config`.
    ///
    /// Returns `None` when no probe is configured or outside a Tokio runtime.
    pub fn spawn_configured_probe(&self, config: &EngineConfig) -> Option<ProbeHandle> {
        let probe = config.probe.as_ref()?.probe();
        if Handle::try_current().is_err() {
            debug!("no async runtime, probe not started");
            return None;
        }
        info!(address = probe.address(), "reachability probe started");
        Some(self.spawn_probe(probe))
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`SyncEngine`] from explicit parts.
///
/// Defaults: an in-memory cache with the standard collections, the fixed
/// retry policy, the tracing reporter, offline, three retries.
pub struct EngineBuilder {
    store: Option<Store>,
    queue: Option<MutationQueue>,
    queue_path: Option<PathBuf>,
    clock: Option<ActionClock>,
    max_retries: u32,
    online: bool,
    remote: Option<Arc<dyn Remote>>,
    retry: Arc<dyn RetryPolicy>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        EngineBuilder {
            store: None,
            queue: None,
            queue_path: None,
            clock: None,
            max_retries: 3,
            online: false,
            remote: None,
            retry: Arc::new(FixedRetry),
            reporter: Arc::new(TracingReporter),
        }
    }
}

impl EngineBuilder {
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an already opened queue. Overrides `queue_path`.
    pub fn queue(mut self, queue: MutationQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn queue_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.queue_path = Some(path.into());
        self
    }

    /// Id clock for a queue opened from `queue_path`.
    pub fn clock(mut self, clock: ActionClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn remote(mut self, remote: Arc<dyn Remote>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn retry_policy(mut self, retry: Arc<dyn RetryPolicy>) -> Self {
        self.retry = retry;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn build(self) -> SyncResult<SyncEngine> {
        let remote = self
            .remote
            .ok_or_else(|| SyncError::Config("a remote is required".into()))?;
        let queue = match (self.queue, self.queue_path) {
            (Some(queue), _) => queue,
            (None, Some(path)) => {
                let opened = match self.clock {
                    Some(clock) => MutationQueue::open_with_clock(&path, self.max_retries, clock),
                    None => MutationQueue::open(&path, self.max_retries),
                };
                opened.inspect_err(|e| {
                    if e.is_storage() {
                        error!(path = %path.display(), error = %e, "failed to open mutation queue");
                    }
                })?
            }
            (None, None) => {
                return Err(SyncError::Config("a queue or queue path is required".into()));
            }
        };
        let store = match self.store {
            Some(store) => store,
            None => Store::open_in_memory(CollectionSpec::defaults())?,
        };

        let online = self.online;
        let shared = Arc::new(Shared::new(store, queue, online));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            shared,
            remote,
            self.retry,
            self.reporter,
        ));
        let engine = SyncEngine { orchestrator };
        if online {
            engine.request_sync();
        }
        Ok(engine)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
