//! Natural-key deduplication of prepared records.

use std::collections::{HashMap, HashSet};

use clap::ValueEnum;
use serde_json::Value;

use crate::{
    error::{ImportError, Result},
    storage::Record,
};

/// Which occurrence of a duplicated key survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DuplicatePolicy {
    #[default]
    First,
    Last,
    /// Stop the import when any key repeats.
    Abort,
}

#[derive(Debug, Clone, Default)]
pub struct DedupeOutcome {
    pub records: Vec<Record>,
    pub removed: usize,
    /// Distinct keys that appeared more than once, in first-seen order.
    pub duplicate_keys: Vec<String>,
}

fn key_text(record: &Record, key: &[&str]) -> String {
    key.iter()
        .map(|column| match record.get(*column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Drop records whose `key` repeats an earlier (or later) record's.
///
/// An empty `key` disables deduplication. Surviving records keep their
/// original relative order.
pub fn dedupe(records: Vec<Record>, key: &[&str], policy: DuplicatePolicy) -> Result<DedupeOutcome> {
    if key.is_empty() {
        return Ok(DedupeOutcome {
            records,
            ..Default::default()
        });
    }

    let keys: Vec<String> = records.iter().map(|r| key_text(r, key)).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut duplicate_keys = Vec::new();
    for k in &keys {
        let count = counts.entry(k.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicate_keys.push(k.clone());
        }
    }

    if duplicate_keys.is_empty() {
        return Ok(DedupeOutcome {
            records,
            ..Default::default()
        });
    }

    let keep: Vec<bool> = match policy {
        DuplicatePolicy::Abort => {
            return Err(ImportError::Aborted {
                reason: format!(
                    "{} key(s) appear more than once on ({}), first: {}",
                    duplicate_keys.len(),
                    key.join(", "),
                    duplicate_keys[..duplicate_keys.len().min(10)].join(", ")
                ),
            })
        }
        DuplicatePolicy::First => {
            let mut seen = HashSet::new();
            keys.iter().map(|k| seen.insert(k.as_str())).collect()
        }
        DuplicatePolicy::Last => {
            let mut seen = HashSet::new();
            let mut keep: Vec<bool> = keys.iter().rev().map(|k| seen.insert(k.as_str())).collect();
            keep.reverse();
            keep
        }
    };

    let total = records.len();
    let records: Vec<Record> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, kept)| kept.then_some(record))
        .collect();

    Ok(DedupeOutcome {
        removed: total - records.len(),
        records,
        duplicate_keys,
    })
}
