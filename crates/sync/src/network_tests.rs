// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use yare::parameterized;

#[parameterized(
    offline_to_online = { false, true, Transition::WentOnline },
    online_to_offline = { true, false, Transition::WentOffline },
    online_again = { true, true, Transition::Unchanged },
    offline_again = { false, false, Transition::Unchanged },
)]
fn set_online_reports_transitions(initial: bool, signal: bool, expected: Transition) {
    let monitor = NetworkMonitor::new(initial);
    assert_eq!(monitor.set_online(signal), expected);
    assert_eq!(monitor.is_online(), signal);
}

#[test]
fn concurrent_online_signals_yield_one_transition() {
    let monitor = Arc::new(NetworkMonitor::new(false));
    let went_online = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            let went_online = Arc::clone(&went_online);
            std::thread::spawn(move || {
                if monitor.set_online(true) == Transition::WentOnline {
                    went_online.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(went_online.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn watchers_see_transitions_only() {
    let monitor = NetworkMonitor::new(false);
    let mut rx = monitor.watch();

    monitor.set_online(false);
    assert!(!rx.has_changed().unwrap());

    monitor.set_online(true);
    rx.changed().await.unwrap();
    assert!(*rx.borrow_and_update());
}

#[tokio::test]
async fn probe_detects_listening_socket() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let probe = ReachabilityProbe::new(
        addr.to_string(),
        Duration::from_secs(60),
        Duration::from_secs(1),
    );
    assert!(probe.check().await);

    drop(listener);
    assert!(!probe.check().await);
}

#[tokio::test]
async fn spawned_probe_reports_results() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let probe = ReachabilityProbe::new(
        listener.local_addr().unwrap().to_string(),
        Duration::from_millis(10),
        Duration::from_secs(1),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = probe.spawn(move |reachable| {
        let _ = tx.send(reachable);
    });

    assert_eq!(rx.recv().await, Some(true));
    handle.stop();
}
