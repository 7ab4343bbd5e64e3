// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use ph_sync::SyncStatus;

use super::open_engine;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let status = open_engine(state_dir)?.status();
    match output {
        OutputFormat::Text => print!("{}", format_status(&status)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn format_status(status: &SyncStatus) -> String {
    let last_sync = status
        .last_sync_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let last_error = status
        .last_error
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "online:     {}\npending:    {}\nsyncing:    {}\nlast sync:  {}\nlast error: {}\n",
        yes_no(status.is_online),
        status.pending_actions,
        yes_no(status.sync_in_progress),
        last_sync,
        last_error
    )
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
