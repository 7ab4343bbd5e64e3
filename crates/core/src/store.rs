// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed persistent store for cached domain records.
//!
//! Records are JSON objects grouped into named collections. Each collection
//! declares the field holding its primary key and any fields to index for
//! secondary lookups. Index rows live in their own table and are rewritten
//! in the same transaction as the record.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};

/// SQL schema for the record cache.
pub const SCHEMA: &str = r#"
-- One row per cached record; seq fixes insertion order within a collection
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    seq INTEGER NOT NULL,
    data TEXT NOT NULL,
    PRIMARY KEY (collection, key)
);

-- Secondary index entries, one per (record, indexed field)
CREATE TABLE IF NOT EXISTS record_index (
    collection TEXT NOT NULL,
    index_name TEXT NOT NULL,
    value TEXT NOT NULL,
    key TEXT NOT NULL,
    PRIMARY KEY (collection, index_name, key)
);

CREATE INDEX IF NOT EXISTS idx_records_seq ON records(collection, seq);
CREATE INDEX IF NOT EXISTS idx_record_index_value ON record_index(collection, index_name, value);
"#;

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

/// Declaration of one collection: its key field and indexed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    /// Top-level field holding the primary key.
    pub key_path: String,
    /// Top-level fields available to [`Store::get_all_by_index`].
    pub indexes: Vec<String>,
}

impl CollectionSpec {
    /// Declares a collection without secondary indexes.
    pub fn new(name: impl Into<String>, key_path: impl Into<String>) -> Self {
        CollectionSpec {
            name: name.into(),
            key_path: key_path.into(),
            indexes: Vec::new(),
        }
    }

    /// Adds a secondary index on a top-level field.
    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.indexes.push(field.into());
        self
    }

    /// The PropertyHub domain collections.
    pub fn defaults() -> Vec<CollectionSpec> {
        vec![
            CollectionSpec::new("properties", "id")
                .with_index("location")
                .with_index("status"),
            CollectionSpec::new("users", "id").with_index("email"),
            CollectionSpec::new("notifications", "id")
                .with_index("read")
                .with_index("type"),
            CollectionSpec::new("messages", "id").with_index("conversationId"),
            CollectionSpec::new("bookings", "id")
                .with_index("propertyId")
                .with_index("status"),
        ]
    }

    fn has_index(&self, index: &str) -> bool {
        self.indexes.iter().any(|i| i == index)
    }
}

/// Canonical string form of a scalar JSON value, used for keys and index
/// entries. Nulls, arrays and objects have none.
pub fn index_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse stored JSON, returning a rusqlite error on corruption.
fn parse_record(data: &str, key: &str) -> std::result::Result<Value, rusqlite::Error> {
    serde_json::from_str(data).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "record '{key}' does not hold valid JSON"
            ))),
        )
    })
}

/// Run schema creation and migrations on a connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    }
    Ok(())
}

/// Durable, collection-partitioned record cache.
pub struct Store {
    conn: Connection,
    specs: Vec<CollectionSpec>,
}

impl Store {
    /// Open (or create) the store at the given path.
    ///
    /// Any failure here means the cache cannot guarantee durability and
    /// must be treated as fatal by the caller.
    pub fn open(path: &Path, specs: Vec<CollectionSpec>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;

        run_migrations(&conn)?;
        Ok(Store { conn, specs })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(specs: Vec<CollectionSpec>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Store { conn, specs })
    }

    /// Names of the declared collections.
    pub fn collections(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns true if the collection is declared.
    pub fn has_collection(&self, collection: &str) -> bool {
        self.specs.iter().any(|s| s.name == collection)
    }

    fn spec(&self, collection: &str) -> Result<&CollectionSpec> {
        self.specs
            .iter()
            .find(|s| s.name == collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))
    }

    /// Extracts the primary key of a record for the given collection.
    pub fn key_of(&self, collection: &str, record: &Value) -> Result<String> {
        let spec = self.spec(collection)?;
        let obj = record
            .as_object()
            .ok_or_else(|| Error::NotAnObject(record.to_string()))?;

        obj.get(&spec.key_path)
            .filter(|v| v.is_string() || v.is_number())
            .and_then(index_value)
            .ok_or_else(|| Error::MissingKey {
                collection: collection.to_string(),
                key_path: spec.key_path.clone(),
            })
    }

    /// Insert or update a record by its primary key.
    ///
    /// An update keeps the record's original insertion position.
    /// Returns the key the record was stored under.
    pub fn put(&mut self, collection: &str, record: &Value) -> Result<String> {
        let key = self.key_of(collection, record)?;
        let spec = self.spec(collection)?.clone();
        let data = serde_json::to_string(record)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO records (collection, key, seq, data)
             VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM records WHERE collection = ?1), ?3)
             ON CONFLICT(collection, key) DO UPDATE SET data = excluded.data",
            params![collection, key, data],
        )?;
        tx.execute(
            "DELETE FROM record_index WHERE collection = ?1 AND key = ?2",
            params![collection, key],
        )?;
        for index in &spec.indexes {
            if let Some(value) = record.get(index).and_then(index_value) {
                tx.execute(
                    "INSERT INTO record_index (collection, index_name, value, key)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![collection, index, value, key],
                )?;
            }
        }
        tx.commit()?;

        Ok(key)
    }

    /// Get a record by primary key.
    pub fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        self.spec(collection)?;

        let record = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE collection = ?1 AND key = ?2",
                params![collection, key],
                |row| {
                    let data: String = row.get(0)?;
                    parse_record(&data, key)
                },
            )
            .optional()?;

        Ok(record)
    }

    /// All records of a collection, in insertion order.
    pub fn get_all(&self, collection: &str) -> Result<Vec<Value>> {
        self.spec(collection)?;

        let mut stmt = self.conn.prepare(
            "SELECT key, data FROM records WHERE collection = ?1 ORDER BY seq",
        )?;
        let records = stmt
            .query_map(params![collection], |row| {
                let key: String = row.get(0)?;
                let data: String = row.get(1)?;
                parse_record(&data, &key)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Records whose indexed field equals `value`, in insertion order.
    pub fn get_all_by_index(
        &self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let spec = self.spec(collection)?;
        if !spec.has_index(index) {
            return Err(Error::UnknownIndex {
                collection: collection.to_string(),
                index: index.to_string(),
            });
        }
        let Some(value) = index_value(value) else {
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            "SELECT r.key, r.data FROM records r
             JOIN record_index i ON i.collection = r.collection AND i.key = r.key
             WHERE r.collection = ?1 AND i.index_name = ?2 AND i.value = ?3
             ORDER BY r.seq",
        )?;
        let records = stmt
            .query_map(params![collection, index, value], |row| {
                let key: String = row.get(0)?;
                let data: String = row.get(1)?;
                parse_record(&data, &key)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Delete a record. Returns true if one was removed.
    pub fn delete(&mut self, collection: &str, key: &str) -> Result<bool> {
        self.spec(collection)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM record_index WHERE collection = ?1 AND key = ?2",
            params![collection, key],
        )?;
        let removed = tx.execute(
            "DELETE FROM records WHERE collection = ?1 AND key = ?2",
            params![collection, key],
        )?;
        tx.commit()?;

        Ok(removed > 0)
    }

    /// Evict every record of one collection. Returns how many were removed.
    pub fn clear(&mut self, collection: &str) -> Result<usize> {
        self.spec(collection)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM record_index WHERE collection = ?1",
            params![collection],
        )?;
        let removed = tx.execute(
            "DELETE FROM records WHERE collection = ?1",
            params![collection],
        )?;
        tx.commit()?;

        Ok(removed)
    }

    /// Evict every cached record in every collection.
    pub fn clear_all(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM record_index", [])?;
        let removed = tx.execute("DELETE FROM records", [])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Number of records in one collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        self.spec(collection)?;
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Number of records across all collections.
    pub fn total_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
