//! Read-only checks over a finished history set.

use std::collections::{BTreeSet, HashSet};

use tracing::{info, warn};

use crate::cli::types::{ConferenceId, Season, TeamId};
use crate::error::Result;
use crate::storage::{
    get_bool, get_i64,
    tables::{CONFERENCES, TEAMS, TEAM_CONFERENCE_HISTORY},
    HistoryRecord, Store,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub total_records: usize,
    pub real_records: usize,
    pub placeholder_records: usize,
    /// Rows for seasons the team played with no known conference.
    pub unknown_conference_records: usize,
    pub orphaned_conferences: BTreeSet<ConferenceId>,
    pub duplicate_keys: Vec<(TeamId, Season)>,
    pub teams_with_history: usize,
    pub total_teams: Option<u64>,
    pub first_season: Option<Season>,
    pub last_season: Option<Season>,
    /// Stored rows that could not be read back as history records.
    pub unreadable_rows: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_conferences.is_empty() && self.duplicate_keys.is_empty() && self.unreadable_rows == 0
    }

    pub fn print(&self) {
        println!("\nValidation:");
        if self.duplicate_keys.is_empty() {
            println!("  ✓ No duplicate (team_id, season) pairs");
        } else {
            println!("  ✗ {} duplicate (team_id, season) pairs", self.duplicate_keys.len());
        }
        if self.orphaned_conferences.is_empty() {
            println!("  ✓ No orphaned conference ids");
        } else {
            let ids: Vec<String> = self.orphaned_conferences.iter().map(|c| c.to_string()).collect();
            println!("  ✗ Orphaned conference ids: {}", ids.join(", "));
        }
        println!("  ✓ Gap year records:       {}", self.placeholder_records);
        println!("  ✓ Real records:           {}", self.real_records);
        if self.unknown_conference_records > 0 {
            println!("  ! Unknown conference:     {}", self.unknown_conference_records);
        }
        if let Some(total) = self.total_teams {
            println!("  ✓ Total teams:            {total}");
        }
        println!("  ✓ Teams with history:     {}", self.teams_with_history);
        println!("  ✓ Total history records:  {}", self.total_records);
        if let (Some(first), Some(last)) = (self.first_season, self.last_season) {
            println!("  ✓ Seasons covered:        {first}-{last}");
        }
        if self.unreadable_rows > 0 {
            println!("  ✗ Unreadable rows:        {}", self.unreadable_rows);
        }
    }
}

/// Check `records` against the set of conference ids that exist.
pub fn check_history(records: &[HistoryRecord], known_conferences: &HashSet<ConferenceId>) -> ValidationReport {
    let mut report = ValidationReport {
        total_records: records.len(),
        ..Default::default()
    };
    let mut seen: HashSet<(TeamId, Season)> = HashSet::new();
    let mut teams: HashSet<TeamId> = HashSet::new();

    for record in records {
        if !seen.insert((record.team_id, record.season)) {
            report.duplicate_keys.push((record.team_id, record.season));
        }
        teams.insert(record.team_id);

        match (record.existed, record.conference_id) {
            (false, _) => report.placeholder_records += 1,
            (true, Some(conference)) => {
                report.real_records += 1;
                if !known_conferences.contains(&conference) {
                    report.orphaned_conferences.insert(conference);
                }
            }
            (true, None) => {
                report.real_records += 1;
                report.unknown_conference_records += 1;
            }
        }

        report.first_season = Some(report.first_season.map_or(record.season, |s| s.min(record.season)));
        report.last_season = Some(report.last_season.map_or(record.season, |s| s.max(record.season)));
    }

    report.teams_with_history = teams.len();
    report
}

fn read_history_row(row: &crate::storage::Record) -> Option<HistoryRecord> {
    let team_id = TeamId::new(get_i64(row, "team_id")?);
    let season = Season::new(u16::try_from(get_i64(row, "season")?).ok()?);
    let conference_id = get_i64(row, "conference_id").map(ConferenceId::new);
    let existed = get_bool(row, "existed").unwrap_or(true);
    Some(HistoryRecord {
        team_id,
        season,
        conference_id,
        existed,
    })
}

/// Read the stored history back and check it.
pub async fn validate_store<S: Store>(store: &mut S) -> Result<ValidationReport> {
    info!(store = %store.describe(), "Validating conference history");

    let rows = store
        .select(TEAM_CONFERENCE_HISTORY, &["team_id", "season", "conference_id", "existed"], &[])
        .await?;
    let conferences: HashSet<ConferenceId> = store
        .select(CONFERENCES, &["id"], &[])
        .await?
        .iter()
        .filter_map(|row| get_i64(row, "id"))
        .map(ConferenceId::new)
        .collect();

    let mut unreadable = 0;
    let records: Vec<HistoryRecord> = rows
        .iter()
        .filter_map(|row| {
            let parsed = read_history_row(row);
            if parsed.is_none() {
                unreadable += 1;
            }
            parsed
        })
        .collect();

    let mut report = check_history(&records, &conferences);
    report.unreadable_rows = unreadable;
    report.total_teams = Some(store.count(TEAMS, &[]).await?);

    if !report.orphaned_conferences.is_empty() {
        warn!(count = report.orphaned_conferences.len(), "Orphaned conference ids in history");
    }
    if !report.duplicate_keys.is_empty() {
        warn!(count = report.duplicate_keys.len(), "Duplicate (team_id, season) pairs in history");
    }
    if unreadable > 0 {
        warn!(count = unreadable, "History rows missing team_id or season");
    }

    Ok(report)
}
