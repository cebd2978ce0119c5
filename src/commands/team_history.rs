//! Teams and conference-history import.
//!
//! Phase 0 loads conferences, phase 1 fetches every season's teams, phase 2
//! upserts the teams, phases 3 and 4 rebuild the history table through the
//! resolver and gap filler, and phase 5 validates what was stored.

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use super::common::{load_team_ids, pause, RunLog};
use crate::{
    cbbd::{
        types::{Conference, TeamInfo},
        CbbdClient,
    },
    cli::types::{Season, SeasonRange, SourceId},
    history::{validate_store, FallbackPolicy, HistoryContext, SeasonSnapshots, ValidationReport},
    ingest::{upload_in_batches, UploadMode},
    storage::{get_i64, tables, to_record, ConferenceRow, Record, Store, TeamRow},
    Result,
};

pub const DEFAULT_FIRST_SEASON: u16 = 1925;
pub const DEFAULT_LAST_SEASON: u16 = 2025;
pub const DEFAULT_DELAY_MS: u64 = 100;
const UPSERT_BATCH: usize = 500;

const COUNTERS: &[&str] = &[
    "conferences_processed",
    "seasons_fetched",
    "teams_processed",
    "teams_successful",
    "teams_failed",
    "history_records_created",
    "duplicates_resolved",
    "multi_valued_resolutions",
    "low_confidence_resolutions",
    "anomalies",
    "gap_years_filled",
    "unresolved_seasons",
    "stale_history_removed",
];

#[derive(Debug, Clone)]
pub struct TeamHistoryParams {
    pub seasons: SeasonRange,
    /// Pause between season fetches.
    pub delay: Duration,
    pub fallback: FallbackPolicy,
}

impl Default for TeamHistoryParams {
    fn default() -> Self {
        Self {
            seasons: SeasonRange::new(
                Season::new(DEFAULT_FIRST_SEASON),
                Season::new(DEFAULT_LAST_SEASON),
            ),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            fallback: FallbackPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub struct TeamHistoryOutcome {
    pub log: RunLog,
    pub validation: ValidationReport,
}

fn conference_row(conference: &Conference) -> ConferenceRow {
    ConferenceRow {
        id: conference.id,
        name: conference.name.clone(),
        abbreviation: conference.abbreviation.clone(),
        short_name: conference.short_name.clone(),
    }
}

fn team_row(source_id: &SourceId, team: &TeamInfo, last_active_season: Season) -> TeamRow {
    TeamRow {
        source_id: source_id.clone(),
        school: team.school.clone(),
        mascot: team.mascot.clone(),
        abbreviation: team.abbreviation.clone(),
        display_name: team.display_name.clone(),
        short_display_name: team.short_display_name.clone(),
        primary_color: team.primary_color.clone(),
        secondary_color: team.secondary_color.clone(),
        current_venue_id: team.current_venue_id,
        current_venue: team.current_venue.clone(),
        current_city: team.current_city.clone(),
        current_state: team.current_state.clone(),
        last_active_season,
    }
}

fn describe_row(row: &Record) -> String {
    format!(
        "team_id {} season {}",
        get_i64(row, "team_id").map_or_else(|| "?".to_string(), |v| v.to_string()),
        get_i64(row, "season").map_or_else(|| "?".to_string(), |v| v.to_string())
    )
}

/// Phase 1: fetch each season, oldest first. Failed seasons count as no data.
async fn collect_seasons(
    api: &CbbdClient,
    params: &TeamHistoryParams,
    log: &mut RunLog,
) -> (SeasonSnapshots, HashMap<SourceId, (Season, TeamInfo)>) {
    println!("\nPhase 1: Collecting data from all seasons ({})...", params.seasons);
    let mut snapshots = SeasonSnapshots::new();
    let mut latest: HashMap<SourceId, (Season, TeamInfo)> = HashMap::new();

    for (i, season) in params.seasons.iter().enumerate() {
        if i > 0 {
            pause(params.delay).await;
        }
        let teams = match api.fetch_teams_for_season(season).await {
            Ok(teams) => teams,
            Err(e) => {
                log.error(format!("Failed to fetch teams for season {season}: {e}"));
                continue;
            }
        };
        if snapshots.insert_season(season, &teams) == 0 {
            info!(%season, "No team data");
            continue;
        }
        log.stat("seasons_fetched");

        for team in teams {
            let Some(source_id) = team.source_id.clone() else {
                continue;
            };
            // Seasons ascend, so the last listing seen is the most recent.
            latest.insert(source_id, (season, team));
        }
    }

    println!(
        "Collected data for {} seasons, {} unique teams",
        snapshots.len(),
        latest.len()
    );
    (snapshots, latest)
}

/// Run every phase of the teams and conference-history import.
pub async fn handle_team_history<S: Store>(
    store: &mut S,
    api: &CbbdClient,
    params: TeamHistoryParams,
) -> Result<TeamHistoryOutcome> {
    let mut log = RunLog::new(COUNTERS);
    println!("Starting teams and conference history import ({})", store.describe());

    println!("\nPhase 0: Loading conferences...");
    let conferences = api.fetch_conferences().await?;
    println!("Fetched {} conferences", conferences.len());
    let rows = conferences
        .iter()
        .map(|c| to_record(&conference_row(c)))
        .collect::<Result<Vec<_>>>()?;
    let mode = UploadMode::Upsert { on_conflict: &["id"] };
    let report = upload_in_batches(store, tables::CONFERENCES, &rows, mode, UPSERT_BATCH).await;
    log.add("conferences_processed", report.inserted);
    for failure in &report.failed {
        log.error(format!(
            "Failed to upsert conference {}: {}",
            failure.record.get("name").and_then(|v| v.as_str()).unwrap_or("unknown"),
            failure.error
        ));
    }

    let (snapshots, latest) = collect_seasons(api, &params, &mut log).await;

    println!("\nPhase 2: Upserting teams...");
    let mut team_rows: Vec<(&SourceId, TeamRow)> = latest
        .iter()
        .map(|(source_id, (season, team))| (source_id, team_row(source_id, team, *season)))
        .collect();
    team_rows.sort_by(|a, b| a.0.cmp(b.0));
    let rows = team_rows
        .iter()
        .map(|(_, row)| to_record(row))
        .collect::<Result<Vec<_>>>()?;
    let mode = UploadMode::Upsert { on_conflict: &["source_id"] };
    let report = upload_in_batches(store, tables::TEAMS, &rows, mode, UPSERT_BATCH).await;
    log.add("teams_processed", report.attempted);
    log.add("teams_successful", report.inserted);
    log.add("teams_failed", report.failed.len());
    for failure in &report.failed {
        log.error(format!(
            "Failed to upsert team {}: {}",
            failure.record.get("school").and_then(|v| v.as_str()).unwrap_or("unknown"),
            failure.error
        ));
    }

    let team_ids = load_team_ids(store).await?;
    println!("Mapped {} teams by source_id", team_ids.len());
    let context = HistoryContext::new(snapshots, team_ids);

    println!("\nPhase 3: Building conference history (newest season first)...");
    let mut build = context.resolve(params.fallback);
    log.add("duplicates_resolved", build.stats.duplicates_resolved);
    log.add("multi_valued_resolutions", build.stats.multi_valued);
    log.add("low_confidence_resolutions", build.stats.low_confidence);
    log.add("anomalies", build.stats.anomalies);
    log.warnings.append(&mut build.warnings);
    if !build.unmapped.is_empty() {
        log.warning(format!("{} source ids have no team_id", build.unmapped.len()));
    }

    println!("\nPhase 4: Filling gap years...");
    let gaps = context.fill_gaps(&mut build.records);
    log.add("gap_years_filled", gaps.gap_years);
    log.add("unresolved_seasons", gaps.unresolved);

    let rows = build
        .records
        .iter()
        .map(to_record)
        .collect::<Result<Vec<_>>>()?;
    println!("Writing {} history records...", rows.len());
    let replaced = store
        .replace_all(tables::TEAM_CONFERENCE_HISTORY, &rows, &["team_id", "season"])
        .await?;
    log.add("history_records_created", replaced.written);
    log.add("stale_history_removed", replaced.removed);
    for failure in &replaced.failed {
        let row = rows.get(failure.index).map(describe_row).unwrap_or_default();
        log.error(format!("Failed to insert history for {row}: {}", failure.error));
    }

    println!("\nPhase 5: Running validation checks...");
    let validation = validate_store(store).await?;
    validation.print();

    log.print_summary();
    Ok(TeamHistoryOutcome { log, validation })
}
