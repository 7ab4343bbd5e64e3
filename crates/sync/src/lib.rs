// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ph-sync: the offline-first sync runtime for PropertyHub clients.
//!
//! Mutations are queued durably by [`ph_core`] and replayed against a
//! [`Remote`] whenever the device is online. Consumers hold a [`SyncEngine`]
//! and observe progress through [`SyncStatus`] subscriptions.

pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod orchestrator;
pub mod remote;
pub mod report;
pub mod retry;
mod state;
pub mod status;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::EngineConfig;
pub use engine::{EngineBuilder, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use network::{NetworkMonitor, ProbeHandle, ReachabilityProbe, Transition};
pub use orchestrator::{PassOutcome, PassReport, SkipReason, SyncOrchestrator};
pub use remote::{with_timeout, Disconnected, Remote, RemoteError, RemoteResult, WebSocketRemote};
pub use report::{ErrorCode, ErrorReporter, ReportedError, TracingReporter};
pub use retry::{ExponentialBackoff, FixedRetry, RetryPolicy};
pub use status::{StatusPublisher, Subscription, SyncStatus};
