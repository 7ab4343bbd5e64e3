// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `phsync` bound to the given state directory.
pub fn phsync(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("phsync");
    cmd.arg("--state-dir").arg(state.path()).env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized state directory.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    phsync(&temp).arg("init").assert().success();
    temp
}

/// Helper to initialize with a remote URL.
pub fn init_with_remote(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    phsync(&temp)
        .args(["init", "--remote", url, "--max-retries", "2"])
        .assert()
        .success();
    temp
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {output:?}");
    String::from_utf8_lossy(&output.stdout).into_owned()
}
