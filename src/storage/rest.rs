//! [`Store`] over a hosted PostgREST endpoint.

use std::collections::{BTreeSet, HashSet};

use reqwest::{header::HeaderMap, Client, Response};
use serde_json::Value;
use tracing::{debug, warn};

use super::{tables::table_spec, Filter, Record, ReplaceSummary, RowFailure, Store};
use crate::{
    core::{datastore_header_map, StoreCredentials},
    error::{ImportError, Result},
};


const PAGE_SIZE: usize = 1000;
const WRITE_CHUNK: usize = 500;
const DELETE_CHUNK: usize = 200;

const PREFER_INSERT: &str = "return=minimal";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

pub struct PostgrestStore {
    client: Client,
    rest_url: String,
    headers: HeaderMap,
}

impl PostgrestStore {
    pub fn new(credentials: &StoreCredentials) -> Result<Self> {
        Self::with_url(&credentials.url, &credentials.key)
    }

    /// `project_url` is the project root; requests go to `<project_url>/rest/v1`.
    pub fn with_url(project_url: &str, service_key: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            headers: datastore_header_map(service_key)?,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.rest_url)
    }

    async fn check(table: &str, res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let message = res.text().await.unwrap_or_default();
        Err(ImportError::Store {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn write(&self, table: &str, rows: &[Record], on_conflict: Option<&[&str]>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        // Rows may carry different keys; `columns` lets absent ones take defaults.
        let columns: BTreeSet<&str> = rows
            .iter()
            .flat_map(|r| r.keys().map(String::as_str))
            .collect();
        let mut query = vec![("columns", columns.into_iter().collect::<Vec<_>>().join(","))];

        let prefer = match on_conflict {
            Some(keys) if !keys.is_empty() => {
                query.push(("on_conflict", keys.join(",")));
                PREFER_UPSERT
            }
            _ => PREFER_INSERT,
        };

        debug!(table, rows = rows.len(), prefer, "POST");
        let res = self
            .client
            .post(self.table_url(table))
            .headers(self.headers.clone())
            .header("Prefer", prefer)
            .query(&query)
            .json(rows)
            .send()
            .await?;
        Self::check(table, res).await?;
        Ok(())
    }
}

impl Store for PostgrestStore {
    fn describe(&self) -> String {
        self.rest_url.clone()
    }

    async fn insert(&mut self, table: &str, rows: &[Record]) -> Result<()> {
        table_spec(table)?;
        self.write(table, rows, None).await
    }

    async fn upsert(&mut self, table: &str, rows: &[Record], on_conflict: &[&str]) -> Result<()> {
        table_spec(table)?;
        self.write(table, rows, Some(on_conflict)).await
    }

    /// PostgREST refuses unfiltered deletes, so every row is addressed
    /// through the table's non-null guard column.
    async fn delete_all(&mut self, table: &str) -> Result<()> {
        let spec = table_spec(table)?;
        let res = self
            .client
            .delete(self.table_url(table))
            .headers(self.headers.clone())
            .header("Prefer", PREFER_INSERT)
            .query(&[(spec.guard_column, "not.is.null")])
            .send()
            .await?;
        Self::check(table, res).await?;
        Ok(())
    }

    async fn select(&mut self, table: &str, columns: &[&str], filters: &[Filter]) -> Result<Vec<Record>> {
        let spec = table_spec(table)?;

        let mut query: Vec<(String, String)> = filters.iter().map(filter_param).collect();
        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        };
        query.push(("select".to_string(), projection));
        query.push(("order".to_string(), format!("{}.asc", spec.guard_column)));

        let mut records = Vec::new();
        let mut offset = 0usize;
        loop {
            let res = self
                .client
                .get(self.table_url(table))
                .headers(self.headers.clone())
                .query(&query)
                .query(&[("limit", PAGE_SIZE), ("offset", offset)])
                .send()
                .await?;
            let page: Vec<Record> = Self::check(table, res).await?.json().await?;

            let fetched = page.len();
            records.extend(page);
            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(records)
    }

    async fn count(&mut self, table: &str, filters: &[Filter]) -> Result<u64> {
        let spec = table_spec(table)?;

        let mut query: Vec<(String, String)> = filters.iter().map(filter_param).collect();
        query.push(("select".to_string(), spec.guard_column.to_string()));
        query.push(("limit".to_string(), "1".to_string()));

        let res = self
            .client
            .get(self.table_url(table))
            .headers(self.headers.clone())
            .header("Prefer", "count=exact")
            .query(&query)
            .send()
            .await?;
        let res = Self::check(table, res).await?;

        let range = res
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        content_range_total(&range).ok_or_else(|| ImportError::Store {
            table: table.to_string(),
            status: res.status().as_u16(),
            message: format!("no total in Content-Range '{range}'"),
        })
    }

    /// Upsert the new rows first, then delete rows whose key is no longer
    /// present. The table is never empty in between.
    async fn replace_all(&mut self, table: &str, rows: &[Record], key: &[&str]) -> Result<ReplaceSummary> {
        let spec = table_spec(table)?;
        let mut summary = ReplaceSummary::default();

        for (chunk_index, chunk) in rows.chunks(WRITE_CHUNK).enumerate() {
            let base = chunk_index * WRITE_CHUNK;
            match self.write(table, chunk, Some(key)).await {
                Ok(()) => summary.written += chunk.len(),
                Err(e) => {
                    warn!(table, error = %e, "Chunk rejected, retrying row by row");
                    for (i, row) in chunk.iter().enumerate() {
                        match self.write(table, std::slice::from_ref(row), Some(key)).await {
                            Ok(()) => summary.written += 1,
                            Err(e) => summary.failed.push(RowFailure {
                                index: base + i,
                                error: e.to_string(),
                            }),
                        }
                    }
                }
            }
        }

        let wanted: HashSet<Vec<String>> = rows.iter().map(|r| key_of(r, key)).collect();
        let mut columns: Vec<&str> = key.to_vec();
        if !columns.contains(&spec.guard_column) {
            columns.push(spec.guard_column);
        }

        let existing = self.select(table, &columns, &[]).await?;
        let stale: Vec<String> = existing
            .iter()
            .filter(|r| !wanted.contains(&key_of(r, key)))
            .filter_map(|r| r.get(spec.guard_column).map(in_list_item))
            .collect();

        for chunk in stale.chunks(DELETE_CHUNK) {
            let res = self
                .client
                .delete(self.table_url(table))
                .headers(self.headers.clone())
                .header("Prefer", PREFER_INSERT)
                .query(&[(spec.guard_column, format!("in.({})", chunk.join(",")))])
                .send()
                .await?;
            Self::check(table, res).await?;
            summary.removed += chunk.len();
        }

        Ok(summary)
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn in_list_item(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        other => other.to_string(),
    }
}

fn key_of(record: &Record, key: &[&str]) -> Vec<String> {
    key.iter()
        .map(|k| record.get(*k).map(plain_value).unwrap_or_default())
        .collect()
}

fn filter_param(filter: &Filter) -> (String, String) {
    let op = if filter.value.is_null() {
        "is.null".to_string()
    } else {
        format!("eq.{}", plain_value(&filter.value))
    };
    (filter.column.clone(), op)
}

/// Total from a `Content-Range` header such as `0-0/123` or `*/0`.
pub(crate) fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}
