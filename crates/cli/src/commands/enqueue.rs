// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use ph_core::ActionKind;

use super::{open_engine, parse_json};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(state_dir: &Path, kind: &str, resource: &str, payload: &str) -> Result<()> {
    let kind: ActionKind = kind.parse()?;
    let payload = parse_json("payload", payload)?;
    let pending = open_engine(state_dir)?.enqueue(kind, resource, payload)?;
    println!("Queued {kind} {resource} ({pending} pending)");
    Ok(())
}

pub fn pending(state_dir: &Path, output: OutputFormat) -> Result<()> {
    let actions = open_engine(state_dir)?.pending();
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&actions)?),
        OutputFormat::Text => {
            if actions.is_empty() {
                println!("No pending actions");
            }
            for action in &actions {
                println!(
                    "{}  {:<6}  {}  (attempts {}/{})",
                    action.id,
                    action.kind.as_str(),
                    action.resource,
                    action.retry_count,
                    action.max_retries
                );
            }
        }
    }
    Ok(())
}
