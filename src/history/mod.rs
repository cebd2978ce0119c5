//! Conference-history backfill
//!
//! Runs over a [`HistoryContext`] built once per import: every season's
//! `/teams` listing plus the `source_id -> teams.id` map. Passes run in
//! order and each one only reads what the earlier ones produced:
//!
//! 1. [`resolve_conferences`] / [`history_records`]
//! 2. [`fill_gap_years`]
//! 3. [`check_history`] / [`validate_store`]

pub mod gaps;
pub mod resolver;
pub mod snapshots;
pub mod validate;

pub use gaps::{fill_gap_years, GapReport};
pub use resolver::{
    find_eventual_conference, history_records, resolve_conferences, Eventual, FallbackPolicy, HistoryBuild,
    Resolution, ResolutionStats, ResolvedSeason,
};
pub use snapshots::{HistoryContext, SeasonSnapshots, SeasonTeams};
pub use validate::{check_history, validate_store, ValidationReport};
