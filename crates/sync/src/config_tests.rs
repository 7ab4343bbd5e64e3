// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::tempdir;
use yare::parameterized;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let config = EngineConfig::load(dir.path()).unwrap();

    assert_eq!(config.state_dir, dir.path());
    assert_eq!(config.max_retries, 3);
    assert!(!config.start_online);
    assert_eq!(config.remote.url, None);
    assert_eq!(config.remote.timeout_ms, 10_000);
    assert_eq!(config.retry.strategy, RetryStrategy::Fixed);
    assert!(config.probe.is_none());
    assert_eq!(config.db_path(), dir.path().join("cache.db"));
    assert_eq!(config.queue_path(), dir.path().join("sync_queue.jsonl"));
}

#[test]
fn parses_all_sections() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"
max_retries = 5
start_online = true

[remote]
url = "wss://sync.example.com/ws"
timeout_ms = 2500

[retry]
strategy = "exponential"
base_ms = 100
max_ms = 800
jitter = false

[probe]
address = "example.com:443"
"#,
    )
    .unwrap();

    let config = EngineConfig::load(dir.path()).unwrap();
    assert_eq!(config.max_retries, 5);
    assert!(config.start_online);
    assert_eq!(config.remote.url.as_deref(), Some("wss://sync.example.com/ws"));
    assert_eq!(config.remote.timeout(), Duration::from_millis(2500));
    assert_eq!(config.retry.strategy, RetryStrategy::Exponential);
    assert_eq!(
        config.retry.policy().delay_for(3),
        Some(Duration::from_millis(400))
    );
    let probe = config.probe.expect("probe section");
    assert_eq!(probe.address, "example.com:443");
    assert_eq!(probe.interval_ms, 15_000);
    assert_eq!(probe.timeout_ms, 3_000);
}

#[test]
fn save_then_load_keeps_settings() {
    let dir = tempdir().unwrap();
    let mut config = EngineConfig::for_dir(dir.path());
    config.max_retries = 7;
    config.remote.url = Some("ws://localhost:7070".into());
    config.save().unwrap();

    let loaded = EngineConfig::load(dir.path()).unwrap();
    assert_eq!(loaded, config);
}

#[parameterized(
    zero_retries = { "max_retries = 0" },
    http_url = { "[remote]\nurl = \"http://example.com\"" },
    zero_base = { "[retry]\nstrategy = \"exponential\"\nbase_ms = 0" },
)]
fn rejects_invalid_values(content: &str) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), content).unwrap();
    assert!(matches!(
        EngineConfig::load(dir.path()),
        Err(SyncError::Config(_))
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(CONFIG_FILE_NAME), "max_retries = [").unwrap();
    assert!(matches!(
        EngineConfig::load(dir.path()),
        Err(SyncError::ConfigParse(_))
    ));
}

#[test]
fn fixed_strategy_never_delays() {
    let policy = RetryConfig::default().policy();
    assert_eq!(policy.delay_for(2), None);
}
