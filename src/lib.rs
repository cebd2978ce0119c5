//! College basketball data import library
//!
//! Loads CSV exports and CollegeBasketballData API responses into a
//! relational datastore (local SQLite or a hosted PostgREST endpoint).
//!
//! ## Features
//!
//! - **CSV Imports**: per-table jobs with column renaming, type coercion,
//!   natural-key dedupe and chunked upload with per-row retry
//! - **API Imports**: conferences, teams, rosters, poll rankings and venues
//! - **Conference History**: season-by-season team/conference history,
//!   resolving duplicate same-season listings against later seasons and
//!   filling gap years
//! - **Two Backends**: every job writes through the [`storage::Store`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hoops_import::{
//!     commands::csv_import::{handle_csv_import, CsvImportParams},
//!     ingest::{CsvJobKind, DuplicatePolicy},
//!     storage::ImportDatabase,
//! };
//!
//! # async fn example() -> hoops_import::Result<()> {
//! let mut db = ImportDatabase::open(std::path::Path::new("hoops.db"))?;
//! let params = CsvImportParams {
//!     kind: CsvJobKind::Games,
//!     data_dir: "exports".into(),
//!     source: None,
//!     clear: false,
//!     on_duplicate: DuplicatePolicy::First,
//!     batch_size: None,
//!     failure_dir: ".".into(),
//! };
//!
//! handle_csv_import(&mut db, params).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! Credentials are read from `.env` or the environment:
//! ```bash
//! export CBDB_API_KEY=...
//! export SUPABASE_URL=https://project.supabase.co
//! export SUPABASE_KEY=...
//! ```

pub mod cbbd;
pub mod cli;
pub mod commands;
pub mod core;
pub mod error;
pub mod history;
pub mod ingest;
pub mod storage;

// Re-export commonly used types
pub use cli::types::{AthleteId, ConferenceId, Season, SeasonRange, SourceId, TeamId};
pub use error::{ImportError, Result};
