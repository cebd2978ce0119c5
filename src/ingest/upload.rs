//! Chunked uploads with per-row retry and a failure log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::Result,
    storage::{Record, Store},
};

#[cfg(test)]
mod tests;

/// Error text is cut to this many characters when grouping failures.
const ERROR_KEY_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode<'a> {
    Insert,
    Upsert { on_conflict: &'a [&'a str] },
}

/// A record the datastore refused even on its own.
#[derive(Debug, Clone, Serialize)]
pub struct FailedRecord {
    pub record: Record,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub attempted: usize,
    pub inserted: usize,
    pub batches: usize,
    /// Batches that were rejected whole and retried row by row.
    pub retried_batches: usize,
    pub failed: Vec<FailedRecord>,
}

impl UploadReport {
    pub fn merge(&mut self, other: UploadReport) {
        self.attempted += other.attempted;
        self.inserted += other.inserted;
        self.batches += other.batches;
        self.retried_batches += other.retried_batches;
        self.failed.extend(other.failed);
    }

    /// Most frequent error messages, truncated, by descending count.
    pub fn top_errors(&self, n: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for failure in &self.failed {
            let key: String = failure.error.chars().take(ERROR_KEY_CHARS).collect();
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.truncate(n);
        sorted
    }

    pub fn print_summary(&self) {
        println!("Total records:         {}", self.attempted);
        println!("Successfully written:  {}", self.inserted);
        println!("Failed records:        {}", self.failed.len());
        println!("Batches retried:       {}", self.retried_batches);

        if self.failed.is_empty() {
            return;
        }
        println!("\nTop {} error types:", self.top_errors(5).len());
        for (i, (error, count)) in self.top_errors(5).iter().enumerate() {
            println!("  {}. {error}... ({count} records)", i + 1);
        }
    }
}

async fn write<S: Store>(store: &mut S, table: &str, rows: &[Record], mode: UploadMode<'_>) -> Result<()> {
    match mode {
        UploadMode::Insert => store.insert(table, rows).await,
        UploadMode::Upsert { on_conflict } => store.upsert(table, rows, on_conflict).await,
    }
}

/// Upload `records` in chunks of `batch_size`.
///
/// A rejected chunk is retried one record at a time; records that still
/// fail are collected in the report. Row failures never abort the upload.
pub async fn upload_in_batches<S: Store>(
    store: &mut S,
    table: &str,
    records: &[Record],
    mode: UploadMode<'_>,
    batch_size: usize,
) -> UploadReport {
    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);
    let mut report = UploadReport {
        attempted: records.len(),
        ..Default::default()
    };

    for (i, batch) in records.chunks(batch_size).enumerate() {
        let batch_num = i + 1;
        report.batches += 1;

        match write(store, table, batch, mode).await {
            Ok(()) => {
                report.inserted += batch.len();
                println!("  Batch {batch_num}/{total_batches}: wrote {} records", batch.len());
            }
            Err(e) => {
                warn!(table, batch = batch_num, error = %e, "Batch rejected, retrying individually");
                report.retried_batches += 1;

                let mut batch_ok = 0;
                for record in batch {
                    match write(store, table, std::slice::from_ref(record), mode).await {
                        Ok(()) => batch_ok += 1,
                        Err(e) => {
                            debug!(table, error = %e, "Record rejected");
                            report.failed.push(FailedRecord {
                                record: record.clone(),
                                error: e.to_string(),
                            });
                        }
                    }
                }
                report.inserted += batch_ok;
                println!(
                    "  Batch {batch_num}/{total_batches}: wrote {batch_ok}/{} records after retry",
                    batch.len()
                );
            }
        }
    }

    report
}

/// `import_failures_<table>_<YYYYmmdd_HHMMSS>.json` under `dir`.
pub fn failure_log_path(dir: &Path, table: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("import_failures_{table}_{stamp}.json"))
}

/// Write failed records as pretty JSON. Returns `None` when there is nothing to write.
pub fn write_failure_log(dir: &Path, table: &str, failed: &[FailedRecord]) -> Result<Option<PathBuf>> {
    if failed.is_empty() {
        return Ok(None);
    }
    let path = failure_log_path(dir, table);
    let json = serde_json::to_string_pretty(failed)?;
    std::fs::write(&path, json)?;
    Ok(Some(path))
}
