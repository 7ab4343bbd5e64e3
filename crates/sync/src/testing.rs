// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted remote for tests.
//!
//! [`ScriptedRemote`] records every call, fails according to a
//! [`FaultPolicy`], and can be held open by a [`Gate`] so a test can act
//! while a pass is mid-flight.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use ph_core::{ActionId, ActionKind, Confirmation, QueuedAction};
use tokio::sync::{watch, Notify};

use crate::remote::{Remote, RemoteError, RemoteFuture};

/// Decides whether an attempt fails.
pub enum FaultPolicy {
    AlwaysSucceed,
    AlwaysFail,
    /// Fail the first `n` attempts of every action.
    FailFirst(u32),
    /// Fail every attempt of actions the predicate matches.
    FailMatching(Box<dyn Fn(&QueuedAction) -> bool + Send + Sync>),
}

impl FaultPolicy {
    pub fn fail_matching<F>(predicate: F) -> Self
    where
        F: Fn(&QueuedAction) -> bool + Send + Sync + 'static,
    {
        FaultPolicy::FailMatching(Box::new(predicate))
    }

    /// `attempt` is 1-based.
    fn fails(&self, action: &QueuedAction, attempt: u32) -> bool {
        match self {
            FaultPolicy::AlwaysSucceed => false,
            FaultPolicy::AlwaysFail => true,
            FaultPolicy::FailFirst(n) => attempt <= *n,
            FaultPolicy::FailMatching(predicate) => predicate(action),
        }
    }
}

impl std::fmt::Debug for FaultPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultPolicy::AlwaysSucceed => f.write_str("AlwaysSucceed"),
            FaultPolicy::AlwaysFail => f.write_str("AlwaysFail"),
            FaultPolicy::FailFirst(n) => write!(f, "FailFirst({n})"),
            FaultPolicy::FailMatching(_) => f.write_str("FailMatching(..)"),
        }
    }
}

/// Holds calls until opened.
#[derive(Debug)]
pub struct Gate {
    open: watch::Sender<bool>,
    entered: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        let (open, _rx) = watch::channel(false);
        Arc::new(Gate {
            open,
            entered: Notify::new(),
        })
    }

    /// Wait until some call has reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let held and future calls through.
    pub fn open(&self) {
        self.open.send_replace(true);
    }

    async fn pass(&self) {
        self.entered.notify_one();
        let mut rx = self.open.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[derive(Debug, Default)]
struct Calls {
    log: Vec<QueuedAction>,
    attempts: HashMap<ActionId, u32>,
}

/// In-process [`Remote`] with recorded calls and injectable failures.
#[derive(Debug)]
pub struct ScriptedRemote {
    policy: FaultPolicy,
    echo_records: bool,
    gate: Option<Arc<Gate>>,
    calls: Mutex<Calls>,
}

impl ScriptedRemote {
    pub fn new(policy: FaultPolicy) -> Self {
        ScriptedRemote {
            policy,
            echo_records: false,
            gate: None,
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(FaultPolicy::AlwaysSucceed)
    }

    pub fn failing() -> Self {
        Self::new(FaultPolicy::AlwaysFail)
    }

    /// Confirm creates and updates with the payload as the authoritative
    /// record, and deletes with the payload's `id`.
    pub fn echo_records(mut self) -> Self {
        self.echo_records = true;
        self
    }

    pub fn gated(mut self, gate: Arc<Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every call in arrival order.
    pub fn calls(&self) -> Vec<ActionId> {
        self.lock().log.iter().map(|a| a.id).collect()
    }

    pub fn call_count(&self) -> usize {
        self.lock().log.len()
    }

    pub fn attempts(&self, id: &ActionId) -> u32 {
        self.lock().attempts.get(id).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn confirmation(&self, action: &QueuedAction) -> Confirmation {
        if !self.echo_records {
            return Confirmation::Ack;
        }
        match action.kind {
            ActionKind::Create | ActionKind::Update => Confirmation::Record(action.payload.clone()),
            ActionKind::Delete => match action.payload.get("id").and_then(|v| v.as_str()) {
                Some(key) => Confirmation::Deleted(key.to_string()),
                None => Confirmation::Ack,
            },
        }
    }
}

impl Remote for ScriptedRemote {
    fn execute<'a>(&'a self, action: &'a QueuedAction) -> RemoteFuture<'a> {
        Box::pin(async move {
            let attempt = {
                let mut calls = self.lock();
                calls.log.push(action.clone());
                let attempt = calls.attempts.entry(action.id).or_insert(0);
                *attempt += 1;
                *attempt
            };
            if let Some(gate) = &self.gate {
                gate.pass().await;
            }
            if self.policy.fails(action, attempt) {
                return Err(RemoteError::Rejected(format!(
                    "scripted failure (attempt {attempt})"
                )));
            }
            Ok(self.confirmation(action))
        })
    }
}
