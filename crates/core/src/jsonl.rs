// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) file utilities.
//!
//! Backs the mutation queue: one JSON record per line, fsynced on every write.
//! Whole-file rewrites go through a temporary sibling file and a rename so a
//! crash mid-write leaves either the old or the new content, never a mix.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Appends a record to a JSONL file with fsync for durability.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;

    Ok(())
}

/// Reads all records from a JSONL file.
///
/// Skips blank lines and returns an empty vec if the file doesn't exist.
/// A line that fails to parse is reported with its line number.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let Some(content) = read_bytes(path)? else {
        return Ok(Vec::new());
    };
    parse_lines(path, &content)
}

/// Reads all records, repairing a torn final append.
///
/// A crash inside [`append`] leaves a last line with no trailing newline.
/// That line is kept if it parses and discarded otherwise, and the file is
/// rewritten so the next append starts on a fresh line. Malformed lines
/// before the tail are still errors.
pub fn read_repairing<T: Serialize + DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let Some(content) = read_bytes(path)? else {
        return Ok(Vec::new());
    };
    let split = content.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
    let (body, tail) = content.split_at(split);

    let mut records = parse_lines(path, body)?;
    if tail.iter().all(u8::is_ascii_whitespace) {
        return Ok(records);
    }

    let line = body.iter().filter(|b| **b == b'\n').count() + 1;
    match serde_json::from_slice::<T>(tail) {
        Ok(record) => records.push(record),
        Err(e) => tracing::warn!(
            path = %path.display(),
            line,
            error = %e,
            "discarding torn record at end of log"
        ),
    }
    write_atomic(path, &records)?;

    Ok(records)
}

fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_lines<T: DeserializeOwned>(path: &Path, content: &[u8]) -> Result<Vec<T>> {
    let mut records = Vec::new();

    for (idx, line) in content.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let record: T = serde_json::from_slice(line).map_err(|e| {
            Error::CorruptedData(format!("{}:{}: {e}", path.display(), idx + 1))
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Atomically replaces the content of a JSONL file with the given records.
pub fn write_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let tmp = temp_path(path);

    {
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{json}")?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
