//! Gap-year filling.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::snapshots::{HistoryContext, SeasonSnapshots};
use crate::cli::types::{Season, SeasonRange, SourceId, TeamId};
use crate::storage::HistoryRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapReport {
    pub teams_checked: usize,
    /// Placeholder rows for seasons the team was not listed in.
    pub gap_years: usize,
    /// Seasons the team was listed in but resolution produced no record.
    pub unresolved: usize,
}

/// Complete each team's span from first to last appearance.
///
/// Every season in the span without a record gets one: a placeholder
/// (`existed = false`) when the team was not listed, or an
/// `existed = true` row with no conference when it was listed but left
/// unresolved. Existing records are never touched.
pub fn fill_gap_years(
    snapshots: &SeasonSnapshots,
    team_ids: &HashMap<SourceId, TeamId>,
    records: &mut Vec<HistoryRecord>,
) -> GapReport {
    let mut report = GapReport::default();
    let mut existing: HashSet<(TeamId, Season)> =
        records.iter().map(|r| (r.team_id, r.season)).collect();

    for (source_id, (first, last)) in snapshots.appearance_ranges() {
        let Some(team_id) = team_ids.get(&source_id).copied() else {
            continue;
        };
        report.teams_checked += 1;

        for season in SeasonRange::new(first, last).iter() {
            if !existing.insert((team_id, season)) {
                continue;
            }
            if snapshots.appeared(season, &source_id) {
                records.push(HistoryRecord::observed(team_id, season, None));
                report.unresolved += 1;
            } else {
                debug!(%team_id, %season, "Filling gap year");
                records.push(HistoryRecord::placeholder(team_id, season));
                report.gap_years += 1;
            }
        }
    }

    report
}

impl HistoryContext {
    pub fn fill_gaps(&self, records: &mut Vec<HistoryRecord>) -> GapReport {
        fill_gap_years(&self.snapshots, &self.team_ids, records)
    }
}
