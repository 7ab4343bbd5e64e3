// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;

#[test]
fn creates_config_cache_and_queue() {
    let dir = tempdir().unwrap();
    run(dir.path(), Some("ws://localhost:7070".into()), Some(5)).unwrap();

    let config = EngineConfig::load(dir.path()).unwrap();
    assert_eq!(config.remote.url.as_deref(), Some("ws://localhost:7070"));
    assert_eq!(config.max_retries, 5);
    assert!(config.db_path().exists());
    assert!(config.queue_path().exists());
}

#[test]
fn second_init_fails() {
    let dir = tempdir().unwrap();
    run(dir.path(), None, None).unwrap();
    assert!(matches!(
        run(dir.path(), None, None),
        Err(Error::AlreadyInitialized(_))
    ));
}

#[test]
fn invalid_remote_writes_nothing() {
    let dir = tempdir().unwrap();
    assert!(run(dir.path(), Some("http://nope".into()), None).is_err());
    assert!(!dir.path().join("phsync.toml").exists());
}
