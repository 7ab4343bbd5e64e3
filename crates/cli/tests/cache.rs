// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

fn seed(temp: &TempDir) {
    for record in [
        r#"{"id":"p-1","location":"Lisbon","status":"listed"}"#,
        r#"{"id":"p-2","location":"Porto","status":"listed"}"#,
        r#"{"id":"p-3","location":"Lisbon","status":"draft"}"#,
    ] {
        phsync(temp)
            .args(["put", "properties", record])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Stored properties/p-"));
    }
}

#[test]
fn put_then_get() {
    let temp = init_temp();
    seed(&temp);

    let out = stdout_of(phsync(&temp).args(["get", "properties", "p-2"]));
    let record: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(record["location"], "Porto");
}

#[test]
fn get_missing_record_fails() {
    let temp = init_temp();
    phsync(&temp)
        .args(["get", "properties", "p-404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("record not found: properties/p-404"));
}

#[test]
fn list_all_and_by_index() {
    let temp = init_temp();
    seed(&temp);

    let all = stdout_of(phsync(&temp).args(["list", "properties"]));
    assert_eq!(all.lines().count(), 3);

    let lisbon = stdout_of(phsync(&temp).args([
        "list",
        "properties",
        "--index",
        "location",
        "--value",
        "Lisbon",
    ]));
    let ids: Vec<String> = lisbon
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["id"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(ids, vec!["p-1", "p-3"]);
}

#[test]
fn unknown_collection_and_index_fail() {
    let temp = init_temp();
    phsync(&temp)
        .args(["list", "pets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown collection"));

    phsync(&temp)
        .args(["list", "properties", "--index", "color", "--value", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown index"));
}

#[test]
fn clear_cache_keeps_queue() {
    let temp = init_temp();
    seed(&temp);
    phsync(&temp)
        .args(["enqueue", "CREATE", "booking", r#"{"id":"b-1"}"#])
        .assert()
        .success();

    phsync(&temp)
        .arg("cache-size")
        .assert()
        .success()
        .stdout("3\n");
    phsync(&temp)
        .arg("clear-cache")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 3 cached records"));
    phsync(&temp)
        .arg("cache-size")
        .assert()
        .success()
        .stdout("0\n");
    phsync(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("pending:    1"));
}
