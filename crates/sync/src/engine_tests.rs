// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Mutex;
use std::time::Duration;

use super::*;
use crate::config::ProbeConfig;
use crate::orchestrator::SkipReason;
use crate::remote::Disconnected;
use crate::report::ErrorCode;
use crate::testing::{Gate, ScriptedRemote};
use serde_json::json;
use tempfile::{tempdir, TempDir};

fn engine_with(remote: Arc<ScriptedRemote>, max_retries: u32) -> (TempDir, SyncEngine) {
    let dir = tempdir().unwrap();
    let engine = SyncEngine::builder()
        .queue_path(dir.path().join("sync_queue.jsonl"))
        .max_retries(max_retries)
        .remote(remote)
        .build()
        .unwrap();
    (dir, engine)
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached");
}

fn booking(n: u32) -> serde_json::Value {
    json!({"id": format!("b-{n}"), "propertyId": "p-1", "status": "pending"})
}

#[tokio::test]
async fn offline_bookings_sync_in_one_pass_when_online() {
    let remote = Arc::new(ScriptedRemote::succeeding());
    let (_dir, engine) = engine_with(remote.clone(), 3);

    for n in 1..=3 {
        engine.enqueue(ActionKind::Create, "booking", booking(n)).unwrap();
    }
    assert_eq!(engine.status().pending_actions, 3);
    assert_eq!(remote.call_count(), 0);

    assert_eq!(engine.set_online(true), Transition::WentOnline);
    wait_until(|| {
        let status = engine.status();
        status.pending_actions == 0 && !status.sync_in_progress
    })
    .await;
    let status = engine.status();

    assert!(status.is_online);
    assert!(status.last_sync_time.is_some());
    assert!(status.last_error.is_none());
    assert_eq!(remote.call_count(), 3);
    for id in remote.calls() {
        assert_eq!(remote.attempts(&id), 1);
    }
}

#[tokio::test]
async fn failing_action_is_dropped_after_three_manual_passes() {
    let remote = Arc::new(ScriptedRemote::failing());
    let (_dir, engine) = engine_with(remote.clone(), 3);
    engine.enqueue(ActionKind::Create, "booking", booking(1)).unwrap();
    engine.set_online(true);
    wait_until(|| remote.call_count() == 1 && !engine.status().sync_in_progress).await;

    // The online transition ran the first pass.
    assert_eq!(engine.pending()[0].retry_count, 1);
    engine.sync_now().await;
    let outcome = engine.sync_now().await;

    assert_eq!(outcome.report().unwrap().dropped.len(), 1);
    let status = engine.status();
    assert_eq!(status.pending_actions, 0);
    assert_eq!(
        status.last_error.map(|e| e.code),
        Some(ErrorCode::SyncActionMaxRetries)
    );
    assert_eq!(remote.call_count(), 3);
}

#[tokio::test]
async fn concurrent_sync_requests_run_one_pass() {
    let gate = Gate::new();
    let remote = Arc::new(ScriptedRemote::succeeding().gated(Arc::clone(&gate)));
    let (_dir, engine) = engine_with(remote.clone(), 3);
    engine.enqueue(ActionKind::Update, "properties", json!({"id": "p-1"})).unwrap();
    engine.shared().network.set_online(true);

    let (first, second) = tokio::join!(engine.sync_now(), async {
        gate.entered().await;
        let outcome = engine.sync_now().await;
        gate.open();
        outcome
    });

    assert_eq!(first.report().unwrap().succeeded.len(), 1);
    assert_eq!(second, PassOutcome::Skipped(SkipReason::AlreadySyncing));
    assert_eq!(remote.call_count(), 1);
}

#[tokio::test]
async fn offline_sync_is_skipped() {
    let (_dir, engine) = engine_with(Arc::new(ScriptedRemote::succeeding()), 3);
    engine.enqueue(ActionKind::Create, "booking", booking(1)).unwrap();
    assert_eq!(
        engine.sync_now().await,
        PassOutcome::Skipped(SkipReason::Offline)
    );
    assert_eq!(engine.pending_actions(), 1);
}

#[tokio::test]
async fn pending_count_tracks_enqueue() {
    let (_dir, engine) = engine_with(Arc::new(ScriptedRemote::succeeding()), 3);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = engine.subscribe(move |s| sink.lock().unwrap().push(s.pending_actions));

    for n in 1..=3 {
        let pending = engine.enqueue(ActionKind::Create, "booking", booking(n)).unwrap();
        assert_eq!(pending, n as usize);
        assert_eq!(engine.status().pending_actions, engine.pending_actions());
    }

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn going_offline_updates_status_without_pass() {
    let remote = Arc::new(ScriptedRemote::succeeding());
    let (_dir, engine) = engine_with(remote.clone(), 3);
    engine.set_online(true);
    engine.enqueue(ActionKind::Create, "booking", booking(1)).unwrap();
    wait_until(|| {
        remote.call_count() == 1 && engine.status().pending_actions == 0
    })
    .await;

    assert_eq!(engine.set_online(false), Transition::WentOffline);
    assert_eq!(engine.set_online(false), Transition::Unchanged);
    engine.enqueue(ActionKind::Create, "booking", booking(2)).unwrap();

    let status = engine.status();
    assert!(!status.is_online);
    assert_eq!(status.pending_actions, 1);
    assert_eq!(remote.call_count(), 1);
}

#[tokio::test]
async fn network_watch_sees_transitions() {
    let (_dir, engine) = engine_with(Arc::new(ScriptedRemote::succeeding()), 3);
    let mut rx = engine.network();
    engine.set_online(true);
    rx.changed().await.unwrap();
    assert!(*rx.borrow());
    assert!(engine.is_online());
}

#[tokio::test]
async fn queue_survives_restart() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::for_dir(dir.path());

    let before = {
        let engine = SyncEngine::initialize(&config, Arc::new(Disconnected)).unwrap();
        for n in 1..=4 {
            engine.enqueue(ActionKind::Create, "booking", booking(n)).unwrap();
        }
        engine.pending()
    };

    let engine = SyncEngine::initialize(&config, Arc::new(Disconnected)).unwrap();
    assert_eq!(engine.pending(), before);
    assert_eq!(engine.status().pending_actions, 4);

    // New ids keep sorting after the reloaded ones.
    engine.enqueue(ActionKind::Delete, "booking", json!({"id": "b-1"})).unwrap();
    let pending = engine.pending();
    assert!(pending[4].id > pending[3].id);
}

#[tokio::test]
async fn initialize_online_starts_a_pass() {
    let dir = tempdir().unwrap();
    let mut config = EngineConfig::for_dir(dir.path());
    {
        let engine = SyncEngine::initialize(&config, Arc::new(Disconnected)).unwrap();
        engine.enqueue(ActionKind::Create, "booking", booking(1)).unwrap();
    }

    config.start_online = true;
    let remote = Arc::new(ScriptedRemote::succeeding());
    let engine = SyncEngine::initialize(&config, remote.clone()).unwrap();
    wait_until(|| {
        let status = engine.status();
        status.pending_actions == 0 && !status.sync_in_progress
    })
    .await;

    assert_eq!(remote.call_count(), 1);
    assert!(engine.status().last_sync_time.is_some());
}

#[tokio::test]
async fn configured_probe_drives_connectivity() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dir = tempdir().unwrap();
    let mut config = EngineConfig::for_dir(dir.path());
    config.probe = Some(ProbeConfig {
        address: listener.local_addr().unwrap().to_string(),
        interval_ms: 20,
        timeout_ms: 500,
    });

    let remote = Arc::new(ScriptedRemote::succeeding());
    let engine = SyncEngine::initialize(&config, remote.clone()).unwrap();
    engine.enqueue(ActionKind::Create, "booking", booking(1)).unwrap();
    assert!(!engine.is_online());

    let probe = engine.spawn_configured_probe(&config).unwrap();
    wait_until(|| engine.is_online() && engine.pending_actions() == 0).await;
    assert_eq!(remote.call_count(), 1);

    drop(listener);
    wait_until(|| !engine.is_online()).await;
    probe.stop();
}

#[test]
fn configured_probe_needs_section_and_runtime() {
    let dir = tempdir().unwrap();
    let mut config = EngineConfig::for_dir(dir.path());
    let engine = SyncEngine::initialize(&config, Arc::new(Disconnected)).unwrap();
    assert!(engine.spawn_configured_probe(&config).is_none());

    config.probe = Some(ProbeConfig {
        address: "127.0.0.1:9".into(),
        interval_ms: 1_000,
        timeout_ms: 100,
    });
    assert!(engine.spawn_configured_probe(&config).is_none());
}

#[test]
fn initialize_fails_on_unusable_state_dir() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let config = EngineConfig::for_dir(blocker.join("state"));
    let err = SyncEngine::initialize(&config, Arc::new(Disconnected)).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::FatalStorageError));
}

#[test]
fn request_sync_outside_runtime_is_deferred() {
    let (_dir, engine) = engine_with(Arc::new(ScriptedRemote::succeeding()), 3);
    assert!(engine.request_sync().is_none());
}

#[test]
fn build_requires_remote_and_queue() {
    assert!(matches!(
        SyncEngine::builder().queue_path("/tmp/unused.jsonl").build(),
        Err(SyncError::Config(_))
    ));
    assert!(matches!(
        SyncEngine::builder().remote(Arc::new(Disconnected)).build(),
        Err(SyncError::Config(_))
    ));
}

#[test]
fn cache_operations() {
    let (_dir, engine) = engine_with(Arc::new(ScriptedRemote::succeeding()), 3);
    engine
        .put("properties", &json!({"id": "p-1", "location": "Lisbon", "status": "listed"}))
        .unwrap();
    engine
        .put("properties", &json!({"id": "p-2", "location": "Porto", "status": "listed"}))
        .unwrap();
    engine
        .put("notifications", &json!({"id": "n-1", "read": false, "type": "booking"}))
        .unwrap();

    assert_eq!(engine.cache_size().unwrap(), 3);
    assert_eq!(engine.get_all("properties").unwrap().len(), 2);
    let lisbon = engine
        .get_all_by_index("properties", "location", &json!("Lisbon"))
        .unwrap();
    assert_eq!(lisbon.len(), 1);
    assert_eq!(lisbon[0]["id"], "p-1");
    assert!(engine.delete("properties", "p-2").unwrap());
    assert_eq!(engine.get("properties", "p-2").unwrap(), None);

    engine.enqueue(ActionKind::Create, "booking", booking(1)).unwrap();
    assert_eq!(engine.clear_cache().unwrap(), 2);
    assert_eq!(engine.cache_size().unwrap(), 0);
    assert_eq!(engine.pending_actions(), 1);
}

#[test]
fn unknown_collection_is_an_error() {
    let (_dir, engine) = engine_with(Arc::new(ScriptedRemote::succeeding()), 3);
    assert!(matches!(
        engine.get_all("pets"),
        Err(SyncError::Storage(ph_core::Error::UnknownCollection(_)))
    ));
}

#[derive(Default)]
struct Collect(Mutex<Vec<ErrorCode>>);

impl ErrorReporter for Collect {
    fn report(&self, error: &ReportedError) {
        self.0.lock().unwrap().push(error.code);
    }
}

#[test]
fn storage_failure_on_enqueue_is_reported_fatal() {
    let dir = tempdir().unwrap();
    let reporter = Arc::new(Collect::default());
    let engine = SyncEngine::builder()
        .queue_path(dir.path().join("queue").join("sync_queue.jsonl"))
        .remote(Arc::new(Disconnected))
        .reporter(reporter.clone())
        .build()
        .unwrap();
    std::fs::remove_dir_all(dir.path().join("queue")).unwrap();

    let err = engine
        .enqueue(ActionKind::Create, "booking", booking(1))
        .unwrap_err();

    assert_eq!(err.code(), Some(ErrorCode::FatalStorageError));
    assert_eq!(*reporter.0.lock().unwrap(), vec![ErrorCode::FatalStorageError]);
    assert_eq!(engine.pending_actions(), 0);
    assert_eq!(engine.status().pending_actions, 0);
}
