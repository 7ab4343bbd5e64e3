// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ph_sync::{ErrorCode, ReportedError};

#[test]
fn fresh_status() {
    let text = format_status(&SyncStatus::default());
    assert_eq!(
        text,
        "online:     no\npending:    0\nsyncing:    no\nlast sync:  never\nlast error: none\n"
    );
}

#[test]
fn status_with_error() {
    let status = SyncStatus {
        is_online: true,
        pending_actions: 2,
        last_error: Some(ReportedError::new(ErrorCode::SyncPassFailed, "disk full")),
        ..SyncStatus::default()
    };
    let text = format_status(&status);
    assert!(text.contains("online:     yes"));
    assert!(text.contains("pending:    2"));
    assert!(text.contains("last error: SYNC_PASS_FAILED: disk full"));
}
