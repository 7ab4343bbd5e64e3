// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use super::{open_engine, parse_index_value, parse_json};
use crate::error::{Error, Result};

pub fn get(state_dir: &Path, collection: &str, key: &str) -> Result<()> {
    match open_engine(state_dir)?.get(collection, key)? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => Err(Error::RecordNotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Print records as JSON lines, optionally filtered by `(index, value)`.
pub fn list(state_dir: &Path, collection: &str, filter: Option<(String, String)>) -> Result<()> {
    let engine = open_engine(state_dir)?;
    let records = match filter {
        Some((index, value)) => {
            engine.get_all_by_index(collection, &index, &parse_index_value(&value))?
        }
        None => engine.get_all(collection)?,
    };
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

pub fn put(state_dir: &Path, collection: &str, record: &str) -> Result<()> {
    let record = parse_json("record", record)?;
    let key = open_engine(state_dir)?.put(collection, &record)?;
    println!("Stored {collection}/{key}");
    Ok(())
}

pub fn size(state_dir: &Path) -> Result<()> {
    println!("{}", open_engine(state_dir)?.cache_size()?);
    Ok(())
}

pub fn clear(state_dir: &Path) -> Result<()> {
    let removed = open_engine(state_dir)?.clear_cache()?;
    println!("Cleared {removed} cached records");
    Ok(())
}
