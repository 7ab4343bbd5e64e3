// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn recorder() -> (Arc<Mutex<Vec<SyncStatus>>>, impl Fn(&SyncStatus) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |s: &SyncStatus| sink.lock().unwrap().push(s.clone()))
}

#[test]
fn subscribe_delivers_current_status_immediately() {
    let publisher = StatusPublisher::new(SyncStatus {
        pending_actions: 2,
        ..SyncStatus::default()
    });
    let (seen, callback) = recorder();

    let _sub = publisher.subscribe(callback);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].pending_actions, 2);
}

#[test]
fn update_notifies_only_on_change() {
    let publisher = StatusPublisher::new(SyncStatus::default());
    let (seen, callback) = recorder();
    let _sub = publisher.subscribe(callback);

    publisher.update(|s| s.pending_actions = 1);
    publisher.update(|s| s.pending_actions = 1);
    publisher.update(|s| s.is_online = true);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[1].pending_actions, 1);
    assert!(seen[2].is_online);
    assert_eq!(publisher.current(), seen[2]);
}

#[test]
fn dropping_subscription_stops_delivery() {
    let publisher = StatusPublisher::new(SyncStatus::default());
    let (seen, callback) = recorder();
    let sub = publisher.subscribe(callback);
    assert_eq!(publisher.subscriber_count(), 1);

    sub.unsubscribe();
    publisher.update(|s| s.sync_in_progress = true);

    assert_eq!(publisher.subscriber_count(), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn listener_may_read_current_status() {
    let publisher = Arc::new(StatusPublisher::new(SyncStatus::default()));
    let observed = Arc::new(Mutex::new(Vec::new()));

    let reader = Arc::clone(&publisher);
    let sink = Arc::clone(&observed);
    let _sub = publisher.subscribe(move |s| {
        assert_eq!(reader.current().pending_actions, s.pending_actions);
        sink.lock().unwrap().push(s.pending_actions);
    });
    publisher.update(|s| s.pending_actions = 4);

    assert_eq!(*observed.lock().unwrap(), vec![0, 4]);
}

#[test]
fn subscription_outliving_publisher_is_harmless() {
    let publisher = StatusPublisher::new(SyncStatus::default());
    let sub = publisher.subscribe(|_| {});
    drop(publisher);
    drop(sub);
}

#[test]
fn concurrent_updates_deliver_final_snapshot() {
    let publisher = Arc::new(StatusPublisher::new(SyncStatus::default()));
    let (seen, callback) = recorder();
    let _sub = publisher.subscribe(callback);

    let threads: Vec<_> = (1..=4)
        .map(|n| {
            let publisher = Arc::clone(&publisher);
            std::thread::spawn(move || {
                for i in 0..50 {
                    publisher.update(|s| s.pending_actions = n * 1000 + i);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert!(seen.contains(&publisher.current()));
}
