// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync passes.
//!
//! A pass drains a snapshot of the mutation queue through the remote in
//! enqueue order. Confirmed actions leave the log at once; failed ones come
//! back with a bumped retry count until their budget is spent. Only one pass
//! runs at a time.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use ph_core::{ActionId, Confirmation, QueuedAction};
use tracing::{debug, info, warn};

use crate::remote::Remote;
use crate::report::{ErrorCode, ErrorReporter, ReportedError};
use crate::retry::RetryPolicy;
use crate::state::{lock, Shared};

/// Why a pass did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    AlreadySyncing,
}

/// Per-action results of one pass, each list in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Confirmed by the remote and removed from the queue.
    pub succeeded: Vec<ActionId>,
    /// Failed, kept for a later pass.
    pub retained: Vec<ActionId>,
    /// Failed with the retry budget spent.
    pub dropped: Vec<ActionId>,
    /// Not attempted because a backoff delay was still running.
    pub deferred: Vec<ActionId>,
}

impl PassReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.retained.len() + self.dropped.len()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} synced, {} retrying, {} dropped, {} deferred",
            self.succeeded.len(),
            self.retained.len(),
            self.dropped.len(),
            self.deferred.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Skipped(SkipReason),
    Completed(PassReport),
    /// The actions ran but the resulting queue could not be persisted.
    Failed {
        report: PassReport,
        error: ReportedError,
    },
}

impl PassOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::Skipped(_) => None,
            PassOutcome::Completed(report) | PassOutcome::Failed { report, .. } => Some(report),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, PassOutcome::Skipped(_))
    }
}

/// Marks a pass in flight; clears the flag when dropped.
struct Flight<'a>(&'a AtomicBool);

impl<'a> Flight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Flight(flag))
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs sync passes against one remote.
pub struct SyncOrchestrator {
    shared: Arc<Shared>,
    remote: Arc<dyn Remote>,
    retry: Arc<dyn RetryPolicy>,
    reporter: Arc<dyn ErrorReporter>,
    syncing: AtomicBool,
}

impl SyncOrchestrator {
    pub(crate) fn new(
        shared: Arc<Shared>,
        remote: Arc<dyn Remote>,
        retry: Arc<dyn RetryPolicy>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        SyncOrchestrator {
            shared,
            remote,
            retry,
            reporter,
            syncing: AtomicBool::new(false),
        }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    pub(crate) fn reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Run one pass, or skip it when offline or when a pass is already running.
    pub async fn run_pass(&self) -> PassOutcome {
        if !self.shared.network.is_online() {
            debug!("sync skipped: offline");
            return PassOutcome::Skipped(SkipReason::Offline);
        }
        let Some(flight) = Flight::acquire(&self.syncing) else {
            debug!("sync skipped: pass already running");
            return PassOutcome::Skipped(SkipReason::AlreadySyncing);
        };
        self.shared.status.update(|s| {
            s.sync_in_progress = true;
            s.last_error = None;
        });

        let snapshot = lock(&self.shared.queue).snapshot();
        info!(actions = snapshot.len(), "sync pass started");

        let mut report = PassReport::default();
        let mut residual = Vec::new();
        let mut last_error = None;

        for action in &snapshot {
            if action.is_deferred(Utc::now()) {
                debug!(action = %action.id, "deferred by backoff");
                report.deferred.push(action.id);
                residual.push(action.clone());
                continue;
            }
            debug!(
                action = %action.id,
                kind = %action.kind,
                resource = %action.resource,
                "executing"
            );
            match self.remote.execute(action).await {
                Ok(confirmation) => {
                    report.succeeded.push(action.id);
                    let removed = lock(&self.shared.queue).remove(&action.id);
                    if let Err(e) = removed {
                        warn!(action = %action.id, error = %e, "could not remove confirmed action");
                    }
                    if let Err(e) = self.apply(action, confirmation) {
                        let error = ReportedError::new(
                            ErrorCode::SyncApplyFailed,
                            format!("could not cache confirmed {}: {e}", action.resource),
                        )
                        .for_action(action.id);
                        self.reporter.report(&error);
                        last_error = Some(error);
                    }
                }
                Err(e) => {
                    let mut failed = action.clone();
                    failed.retry_count += 1;
                    if failed.is_exhausted() {
                        let error = ReportedError::new(
                            ErrorCode::SyncActionMaxRetries,
                            format!(
                                "{} {} dropped after {} attempts: {e}",
                                failed.kind, failed.resource, failed.retry_count
                            ),
                        )
                        .for_action(failed.id);
                        self.reporter.report(&error);
                        last_error = Some(error);
                        report.dropped.push(failed.id);
                    } else {
                        failed.not_before = self
                            .retry
                            .delay_for(failed.retry_count)
                            .and_then(|d| chrono::Duration::from_std(d).ok())
                            .map(|d| Utc::now() + d);
                        warn!(
                            action = %failed.id,
                            attempt = failed.retry_count,
                            max = failed.max_retries,
                            error = %e,
                            "action failed, will retry"
                        );
                        report.retained.push(failed.id);
                        residual.push(failed);
                    }
                }
            }
        }

        let outcome = match self.persist_residual(&snapshot, residual) {
            Ok(()) => PassOutcome::Completed(report),
            Err(e) => {
                let error = ReportedError::new(
                    ErrorCode::SyncPassFailed,
                    format!("could not persist queue: {e}"),
                );
                self.reporter.report(&error);
                last_error = Some(error.clone());
                PassOutcome::Failed { report, error }
            }
        };
        let completed = matches!(outcome, PassOutcome::Completed(_));

        // The flag stays held until the final status is out, so a pass that
        // starts next cannot have its in-progress status overwritten.
        let status = self.shared.status.update(|s| {
            s.sync_in_progress = false;
            s.pending_actions = lock(&self.shared.queue).len();
            if completed {
                s.last_sync_time = Some(Utc::now());
            }
            s.last_error = last_error;
        });
        drop(flight);
        if let Some(report) = outcome.report() {
            info!(pending = status.pending_actions, "sync pass finished: {report}");
        }
        outcome
    }

    /// Write the survivors of this pass plus anything enqueued while it ran.
    fn persist_residual(
        &self,
        snapshot: &[QueuedAction],
        residual: Vec<QueuedAction>,
    ) -> ph_core::Result<()> {
        let seen: HashSet<ActionId> = snapshot.iter().map(|a| a.id).collect();
        let mut queue = lock(&self.shared.queue);
        let mut next = residual;
        next.extend(
            queue
                .snapshot()
                .into_iter()
                .filter(|a| !seen.contains(&a.id)),
        );
        queue.replace(next)
    }

    fn apply(&self, action: &QueuedAction, confirmation: Confirmation) -> ph_core::Result<()> {
        let mut store = lock(&self.shared.store);
        if !store.has_collection(&action.resource) {
            debug!(resource = %action.resource, "no local collection, confirmation not cached");
            return Ok(());
        }
        match confirmation {
            Confirmation::Ack => {}
            Confirmation::Record(record) => {
                store.put(&action.resource, &record)?;
            }
            Confirmation::Deleted(key) => {
                store.delete(&action.resource, &key)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("syncing", &self.is_syncing())
            .finish()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
