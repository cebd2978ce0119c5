//! Helpers shared across the import commands.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, warn};

use crate::{
    cli::types::{SourceId, TeamId},
    storage::{get_i64, get_string, tables::TEAMS, Store},
    Result,
};

/// Warnings listed in a run summary.
pub const SUMMARY_WARNINGS: usize = 5;
/// Errors listed in a run summary.
pub const SUMMARY_ERRORS: usize = 10;

/// Counters, warnings and errors collected over one command run.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    stats: Vec<(&'static str, usize)>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl RunLog {
    /// Start with `counters` at zero, in the order they are printed.
    pub fn new(counters: &[&'static str]) -> Self {
        Self {
            stats: counters.iter().map(|c| (*c, 0)).collect(),
            ..Default::default()
        }
    }

    pub fn stat(&mut self, key: &'static str) {
        self.add(key, 1);
    }

    pub fn add(&mut self, key: &'static str, n: usize) {
        match self.stats.iter_mut().find(|(k, _)| *k == key) {
            Some((_, value)) => *value += n,
            None => self.stats.push((key, n)),
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.stats
            .iter()
            .find(|(k, _)| *k == key)
            .map_or(0, |(_, v)| *v)
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.errors.push(message);
    }

    pub fn print_summary(&self) {
        print_banner("IMPORT SUMMARY");
        for (key, value) in &self.stats {
            println!("{key}: {value}");
        }
        println!("\nWarnings: {}", self.warnings.len());
        println!("Errors: {}", self.errors.len());

        if !self.warnings.is_empty() {
            println!("\nFirst {} warnings:", self.warnings.len().min(SUMMARY_WARNINGS));
            for w in self.warnings.iter().take(SUMMARY_WARNINGS) {
                println!("  - {w}");
            }
        }
        print_errors(&self.errors);
    }
}

/// Print up to [`SUMMARY_ERRORS`] errors and how many were left out.
pub fn print_errors(errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    println!("\nErrors ({} total):", errors.len());
    for e in errors.iter().take(SUMMARY_ERRORS) {
        println!("  - {e}");
    }
    if errors.len() > SUMMARY_ERRORS {
        println!("  ... and {} more errors", errors.len() - SUMMARY_ERRORS);
    }
}

pub fn print_banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Empty `table`. A failure is reported but does not stop the import.
pub async fn clear_table<S: Store>(store: &mut S, table: &str) {
    println!("Clearing existing data in {table}...");
    match store.delete_all(table).await {
        Ok(()) => println!("✓ {table} cleared"),
        Err(e) => warn!(table, error = %e, "Could not clear table"),
    }
}

/// `source_id -> teams.id` for every team that has a source id.
pub async fn load_team_ids<S: Store>(store: &mut S) -> Result<HashMap<SourceId, TeamId>> {
    let rows = store.select(TEAMS, &["id", "source_id"], &[]).await?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let source_id = get_string(row, "source_id").filter(|s| !s.is_empty())?;
            let id = get_i64(row, "id")?;
            Some((SourceId::new(source_id), TeamId::new(id)))
        })
        .collect())
}

/// UTC timestamp for `created_at` / `updated_at` columns.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Fixed delay between API calls.
pub async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
