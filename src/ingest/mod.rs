//! CSV ingestion
//!
//! - `reader`: file discovery and CSV parsing
//! - `columns`: header renaming
//! - `coerce`: cell type coercion
//! - `dedupe`: natural-key deduplication
//! - `jobs`: the per-table job definitions
//! - `upload`: chunked upload with per-row retry

pub mod coerce;
pub mod columns;
pub mod dedupe;
pub mod jobs;
pub mod reader;
pub mod upload;

pub use coerce::ColumnKind;
pub use dedupe::{dedupe, DedupeOutcome, DuplicatePolicy};
pub use jobs::{CsvJob, CsvJobKind, CsvSource};
pub use reader::{read_csv, season_files, CsvTable, SeasonFile};
pub use upload::{upload_in_batches, write_failure_log, FailedRecord, UploadMode, UploadReport};
