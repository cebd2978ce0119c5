//! Storage layer for the import CLI
//!
//! Every job writes through the [`Store`] trait, which has two backends:
//! - `schema` / `queries`: a local SQLite file (`ImportDatabase`)
//! - `rest`: a hosted PostgREST endpoint (`PostgrestStore`)
//!
//! Rows travel as JSON objects ([`Record`]) because the CSV jobs carry
//! whatever columns their source files have. `models` holds the typed rows
//! the API jobs build, and `tables` the registry of known tables.

pub mod models;
pub mod queries;
pub mod rest;
pub mod schema;
pub mod tables;


use serde_json::Value;

use crate::Result;

pub use models::*;
pub use rest::PostgrestStore;
pub use schema::ImportDatabase;
pub use tables::{table_spec, TableSpec};

/// One row as column name -> JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            value: value.into(),
        }
    }
}

/// A row the datastore refused, by position in the submitted slice.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub index: usize,
    pub error: String,
}

/// Outcome of a full table replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaceSummary {
    pub written: usize,
    pub removed: usize,
    pub failed: Vec<RowFailure>,
}

/// Insert/upsert/delete/select client over a relational datastore.
///
/// Batch writes are all-or-nothing: when `insert` or `upsert` returns an
/// error, none of the rows in that call were stored.
#[allow(async_fn_in_trait)]
pub trait Store {
    /// Human-readable target, for log lines.
    fn describe(&self) -> String;

    async fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()>;

    async fn upsert(&mut self, table: &str, rows: &[Record], on_conflict: &[&str]) -> Result<()>;

    async fn delete_all(&mut self, table: &str) -> Result<()>;

    async fn select(&mut self, table: &str, columns: &[&str], filters: &[Filter]) -> Result<Vec<Record>>;

    async fn count(&mut self, table: &str, filters: &[Filter]) -> Result<u64>;

    /// Swap the table contents for `rows` without exposing an empty table.
    ///
    /// `key` is the natural key used to tell new rows from stale ones.
    /// Individual rows that fail are reported, not fatal.
    async fn replace_all(&mut self, table: &str, rows: &[Record], key: &[&str]) -> Result<ReplaceSummary>;
}

/// Read an integer column, accepting numeric strings.
pub fn get_i64(record: &Record, column: &str) -> Option<i64> {
    match record.get(column)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a boolean column, accepting SQLite's 0/1.
pub fn get_bool(record: &Record, column: &str) -> Option<bool> {
    match record.get(column)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a text column, rendering numbers as text.
pub fn get_string(record: &Record, column: &str) -> Option<String> {
    match record.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
