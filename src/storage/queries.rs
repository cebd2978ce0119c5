//! [`Store`] operations for the SQLite backend

use std::collections::BTreeSet;

use rusqlite::{
    params_from_iter,
    types::{Value as SqlValue, ValueRef},
    Connection,
};
use serde_json::{Number, Value};

use super::{
    schema::{quote_ident, ImportDatabase},
    tables::table_spec,
    Filter, Record, ReplaceSummary, RowFailure, Store,
};
use crate::error::Result;

impl ImportDatabase {
    fn prepare_columns(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        let columns: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
        self.ensure_columns(table, columns)
    }

    /// Write a batch inside one transaction so a failing row leaves nothing behind.
    fn write_batch(&mut self, table: &str, rows: &[Record], on_conflict: Option<&[&str]>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.prepare_columns(table, rows)?;

        let tx = self.conn.transaction()?;
        for row in rows {
            write_row(&tx, table, row, on_conflict)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl Store for ImportDatabase {
    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite::memory:".to_string(),
        }
    }

    async fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        self.write_batch(table, rows, None)
    }

    async fn upsert(&mut self, table: &str, rows: &[Record], on_conflict: &[&str]) -> Result<()> {
        self.write_batch(table, rows, Some(on_conflict))
    }

    async fn delete_all(&mut self, table: &str) -> Result<()> {
        table_spec(table)?;
        self.conn
            .execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
        Ok(())
    }

    async fn select(&mut self, table: &str, columns: &[&str], filters: &[Filter]) -> Result<Vec<Record>> {
        table_spec(table)?;

        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ")
        };
        let (where_sql, params) = where_clause(filters);
        let sql = format!("SELECT {projection} FROM {}{where_sql}", quote_ident(table));

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), from_sql_value(row.get_ref(i)?));
            }
            records.push(record);
        }

        Ok(records)
    }

    async fn count(&mut self, table: &str, filters: &[Filter]) -> Result<u64> {
        table_spec(table)?;

        let (where_sql, params) = where_clause(filters);
        let sql = format!("SELECT COUNT(*) FROM {}{where_sql}", quote_ident(table));
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;

        Ok(count.max(0) as u64)
    }

    /// Delete and re-insert inside one transaction; readers never see the
    /// table empty and a failed commit leaves the old contents in place.
    async fn replace_all(&mut self, table: &str, rows: &[Record], _key: &[&str]) -> Result<ReplaceSummary> {
        self.prepare_columns(table, rows)?;

        let tx = self.conn.transaction()?;
        let removed = tx.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;

        let mut summary = ReplaceSummary {
            removed,
            ..Default::default()
        };
        for (index, row) in rows.iter().enumerate() {
            // A constraint failure only aborts its own statement.
            match write_row(&tx, table, row, None) {
                Ok(()) => summary.written += 1,
                Err(e) => summary.failed.push(RowFailure {
                    index,
                    error: e.to_string(),
                }),
            }
        }

        tx.commit()?;
        Ok(summary)
    }
}

fn write_row(conn: &Connection, table: &str, row: &Record, on_conflict: Option<&[&str]>) -> Result<()> {
    if row.is_empty() {
        return Ok(());
    }

    let columns: Vec<&String> = row.keys().collect();
    let sql = insert_sql(table, &columns, on_conflict);
    let values: Vec<SqlValue> = row.values().map(to_sql_value).collect();

    conn.prepare_cached(&sql)?
        .execute(params_from_iter(values.iter()))?;
    Ok(())
}

pub(crate) fn insert_sql(table: &str, columns: &[&String], on_conflict: Option<&[&str]>) -> String {
    let names = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_ident(table)
    );

    if let Some(keys) = on_conflict.filter(|k| !k.is_empty()) {
        let target = keys.iter().map(|k| quote_ident(k)).collect::<Vec<_>>().join(", ");
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !keys.contains(&c.as_str()))
            .map(|c| {
                let quoted = quote_ident(c);
                format!("{quoted} = excluded.{quoted}")
            })
            .collect();

        if updates.is_empty() {
            sql.push_str(&format!(" ON CONFLICT ({target}) DO NOTHING"));
        } else {
            sql.push_str(&format!(
                " ON CONFLICT ({target}) DO UPDATE SET {}",
                updates.join(", ")
            ));
        }
    }

    sql
}

fn where_clause(filters: &[Filter]) -> (String, Vec<SqlValue>) {
    if filters.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut params = Vec::new();
    let conditions: Vec<String> = filters
        .iter()
        .map(|f| {
            if f.value.is_null() {
                format!("{} IS NULL", quote_ident(&f.column))
            } else {
                params.push(to_sql_value(&f.value));
                format!("{} = ?", quote_ident(&f.column))
            }
        })
        .collect();

    (format!(" WHERE {}", conditions.join(" AND ")), params)
}

/// JSON -> SQLite: booleans become 0/1, nested values are stored as JSON text.
pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

pub(crate) fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}
