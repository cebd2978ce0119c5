//! Player and roster-entry import from `/teams/roster`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, warn};

use super::common::{load_team_ids, pause, print_banner, print_errors, timestamp};
use crate::{
    cbbd::{types::RosterPlayer, CbbdClient},
    cli::types::{AthleteId, Season, SeasonRange, SourceId, TeamId},
    ingest::{dedupe, upload_in_batches, DuplicatePolicy, FailedRecord, UploadMode},
    storage::{get_i64, get_string, tables, to_record, PlayerRow, Record, RosterEntryRow, Store},
    Result,
};

pub const DEFAULT_FIRST_SEASON: u16 = 2005;
pub const DEFAULT_LAST_SEASON: u16 = 2026;
pub const DEFAULT_DELAY_MS: u64 = 500;
pub const DEFAULT_PROGRESS_FILE: &str = "roster_import_progress.log";

/// Teams processed between uploads and between progress lines.
const FLUSH_EVERY_TEAMS: usize = 100;
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);
const UPSERT_BATCH: usize = 500;

const PLAYER_KEY: &[&str] = &["id"];
const ROSTER_KEY: &[&str] = &["athlete_id", "team_id", "season"];

#[derive(Debug, Clone)]
pub struct RosterParams {
    pub seasons: SeasonRange,
    pub delay: Duration,
    pub progress_file: PathBuf,
}

impl Default for RosterParams {
    fn default() -> Self {
        Self {
            seasons: SeasonRange::new(
                Season::new(DEFAULT_FIRST_SEASON),
                Season::new(DEFAULT_LAST_SEASON),
            ),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            progress_file: PathBuf::from(DEFAULT_PROGRESS_FILE),
        }
    }
}

/// What is already stored for a player, carried between seasons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistingPlayer {
    pub first_season: Option<Season>,
    pub last_season: Option<Season>,
    pub created_at: Option<String>,
    pub hometown_city: Option<String>,
    pub hometown_state: Option<String>,
    pub hometown_country: Option<String>,
}

impl ExistingPlayer {
    fn from_record(row: &Record) -> Option<(AthleteId, Self)> {
        let id = AthleteId::new(get_i64(row, "id")?);
        let season = |column: &str| {
            get_i64(row, column)
                .and_then(|v| u16::try_from(v).ok())
                .map(Season::new)
        };
        Some((
            id,
            Self {
                first_season: season("first_season"),
                last_season: season("last_season"),
                created_at: get_string(row, "created_at"),
                hometown_city: get_string(row, "hometown_city"),
                hometown_state: get_string(row, "hometown_state"),
                hometown_country: get_string(row, "hometown_country"),
            },
        ))
    }

    fn from_row(row: &PlayerRow) -> Self {
        Self {
            first_season: Some(row.first_season),
            last_season: Some(row.last_season),
            created_at: Some(row.created_at.clone()),
            hometown_city: row.hometown_city.clone(),
            hometown_state: row.hometown_state.clone(),
            hometown_country: row.hometown_country.clone(),
        }
    }
}

/// Merge one roster listing into what is known about the player.
///
/// The season span only ever widens; hometown and `created_at` survive when
/// the listing has none.
pub fn merge_player(
    existing: Option<&ExistingPlayer>,
    player: &RosterPlayer,
    season: Season,
    now: &str,
) -> PlayerRow {
    let start = player.start_season.unwrap_or(season);
    let end = player.end_season.unwrap_or(season);
    let first_season = existing
        .and_then(|e| e.first_season)
        .map_or(start, |s| s.min(start));
    let last_season = existing
        .and_then(|e| e.last_season)
        .map_or(end, |s| s.max(end));

    let (hometown_city, hometown_state, hometown_country) = match &player.hometown {
        Some(h) => (h.city.clone(), h.state.clone(), h.country.clone()),
        None => existing.map_or((None, None, None), |e| {
            (
                e.hometown_city.clone(),
                e.hometown_state.clone(),
                e.hometown_country.clone(),
            )
        }),
    };

    PlayerRow {
        id: player.id,
        source_id: player.source_id.clone(),
        name: player.name.clone(),
        first_name: player.first_name.clone(),
        last_name: player.last_name.clone(),
        position: player.position.clone(),
        height: player.height,
        weight: player.weight,
        hometown_city,
        hometown_state,
        hometown_country,
        first_season,
        last_season,
        roster_data_available: true,
        created_at: existing
            .and_then(|e| e.created_at.clone())
            .unwrap_or_else(|| now.to_string()),
        updated_at: now.to_string(),
    }
}

pub fn roster_entry(player: &RosterPlayer, team_id: TeamId, season: Season) -> RosterEntryRow {
    RosterEntryRow {
        athlete_id: player.id,
        team_id,
        season,
        jersey: player.jersey.clone(),
        position: player.position.clone(),
        height: player.height,
        weight: player.weight,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonResult {
    pub season: Option<Season>,
    pub players_updated: usize,
    pub rosters_inserted: usize,
    pub teams_matched: usize,
    /// Teams whose source id is not in `teams` (outside Division I).
    pub teams_skipped: usize,
    pub errors: Vec<String>,
}

impl SeasonResult {
    fn new(season: Season) -> Self {
        Self {
            season: Some(season),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct RosterOutcome {
    pub results: Vec<SeasonResult>,
}

impl RosterOutcome {
    pub fn total_players(&self) -> usize {
        self.results.iter().map(|r| r.players_updated).sum()
    }

    pub fn total_rosters(&self) -> usize {
        self.results.iter().map(|r| r.rosters_inserted).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.results.iter().map(|r| r.errors.len()).sum()
    }
}

/// Rows waiting for the next upload.
#[derive(Default)]
struct Pending {
    players: Vec<Record>,
    entries: Vec<Record>,
}

fn player_failure(failure: &FailedRecord) -> String {
    format!(
        "Player {} ({}): {}",
        get_string(&failure.record, "name").unwrap_or_else(|| "unknown".to_string()),
        get_i64(&failure.record, "id").map_or_else(|| "unknown".to_string(), |v| v.to_string()),
        failure.error
    )
}

fn entry_failure(failure: &FailedRecord) -> String {
    format!(
        "Roster entry athlete {} team {}: {}",
        get_i64(&failure.record, "athlete_id").map_or_else(|| "?".to_string(), |v| v.to_string()),
        get_i64(&failure.record, "team_id").map_or_else(|| "?".to_string(), |v| v.to_string()),
        failure.error
    )
}

async fn flush<S: Store>(store: &mut S, pending: &mut Pending, result: &mut SeasonResult) {
    // A player listed twice in one flush keeps the later listing.
    let players = match dedupe(std::mem::take(&mut pending.players), PLAYER_KEY, DuplicatePolicy::Last) {
        Ok(outcome) => outcome.records,
        Err(e) => {
            result.errors.push(e.to_string());
            return;
        }
    };
    let mode = UploadMode::Upsert { on_conflict: PLAYER_KEY };
    let report = upload_in_batches(store, tables::PLAYERS, &players, mode, UPSERT_BATCH).await;
    result.players_updated += report.inserted;
    result.errors.extend(report.failed.iter().map(player_failure));

    let entries = std::mem::take(&mut pending.entries);
    let mode = UploadMode::Upsert { on_conflict: ROSTER_KEY };
    let report = upload_in_batches(store, tables::PLAYER_TEAM_ROSTERS, &entries, mode, UPSERT_BATCH).await;
    result.rosters_inserted += report.inserted;
    result.errors.extend(report.failed.iter().map(entry_failure));
}

async fn load_existing_players<S: Store>(store: &mut S) -> Result<HashMap<AthleteId, ExistingPlayer>> {
    let columns = [
        "id",
        "first_season",
        "last_season",
        "created_at",
        "hometown_city",
        "hometown_state",
        "hometown_country",
    ];
    let rows = store.select(tables::PLAYERS, &columns, &[]).await?;
    Ok(rows.iter().filter_map(ExistingPlayer::from_record).collect())
}

async fn import_season<S: Store>(
    store: &mut S,
    api: &CbbdClient,
    season: Season,
    team_ids: &HashMap<SourceId, TeamId>,
    players: &mut HashMap<AthleteId, ExistingPlayer>,
) -> SeasonResult {
    print_banner(&format!("SEASON {season}"));
    let mut result = SeasonResult::new(season);

    let rosters = match api.fetch_rosters(season).await {
        Ok(rosters) if rosters.is_empty() => {
            warn!(%season, "No roster data available");
            result.errors.push(format!("No roster data available for season {season}"));
            return result;
        }
        Ok(rosters) => rosters,
        Err(e) => {
            warn!(%season, error = %e, "Roster fetch failed");
            result.errors.push(format!("API error: {e}"));
            return result;
        }
    };
    println!("✓ Received {} teams from API", rosters.len());

    let total = rosters.len();
    let start = Instant::now();
    let mut last_update = start;
    let mut pending = Pending::default();
    let now = timestamp();

    for (i, roster) in rosters.iter().enumerate() {
        let idx = i + 1;
        if idx % FLUSH_EVERY_TEAMS == 0 || last_update.elapsed() >= PROGRESS_INTERVAL {
            flush(store, &mut pending, &mut result).await;
            let elapsed = start.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 { idx as f64 / elapsed } else { 0.0 };
            let eta = if rate > 0.0 { (total - idx) as f64 / rate } else { 0.0 };
            println!(
                "  → {idx}/{total} teams | Players: {} | Rosters: {} | Errors: {} | ETA: {}s",
                result.players_updated,
                result.rosters_inserted,
                result.errors.len(),
                eta as u64
            );
            last_update = Instant::now();
        }

        let Some(team_id) = roster.team_source_id.as_ref().and_then(|s| team_ids.get(s)) else {
            debug!(team = roster.team.as_deref().unwrap_or("unknown"), "No matching team");
            result.teams_skipped += 1;
            continue;
        };
        result.teams_matched += 1;

        for player in &roster.players {
            let row = merge_player(players.get(&player.id), player, season, &now);
            let entry = roster_entry(player, *team_id, season);
            match (to_record(&row), to_record(&entry)) {
                (Ok(p), Ok(e)) => {
                    pending.players.push(p);
                    pending.entries.push(e);
                    players.insert(player.id, ExistingPlayer::from_row(&row));
                }
                (Err(e), _) | (_, Err(e)) => {
                    result.errors.push(format!("Player {} ({}): {e}", player.name, player.id));
                }
            }
        }
    }
    flush(store, &mut pending, &mut result).await;

    println!("\n✅ SEASON {season} COMPLETE (took {}s)", start.elapsed().as_secs());
    println!("Players updated:          {}", result.players_updated);
    println!("Roster entries inserted:  {}", result.rosters_inserted);
    println!("Teams matched (D-I):      {}", result.teams_matched);
    println!("Teams skipped (non D-I):  {}", result.teams_skipped);
    println!("Errors:                   {}", result.errors.len());
    print_errors(&result.errors);

    result
}

/// Overwrite the progress file with every season finished so far.
pub fn save_progress(path: &Path, results: &[SeasonResult]) -> Result<()> {
    let mut out = format!(
        "Import progress as of {}\n{}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(50)
    );
    for result in results {
        let season = result.season.map_or_else(|| "?".to_string(), |s| s.to_string());
        out.push_str(&format!(
            "Season {season}:\n  Players: {}\n  Rosters: {}\n  Errors: {}\n\n",
            result.players_updated,
            result.rosters_inserted,
            result.errors.len()
        ));
    }
    fs::write(path, out)?;
    Ok(())
}

/// Import rosters for every season in range, oldest first.
pub async fn handle_rosters<S: Store>(
    store: &mut S,
    api: &CbbdClient,
    params: RosterParams,
) -> Result<RosterOutcome> {
    println!(
        "Starting full roster import for seasons {} ({})",
        params.seasons,
        store.describe()
    );
    println!("Start time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    let team_ids = load_team_ids(store).await?;
    println!("✓ Loaded {} Division I teams", team_ids.len());
    let mut players = load_existing_players(store).await?;
    println!("✓ Loaded {} existing players", players.len());

    let mut outcome = RosterOutcome::default();
    for (i, season) in params.seasons.iter().enumerate() {
        if i > 0 {
            pause(params.delay).await;
        }
        let result = import_season(store, api, season, &team_ids, &mut players).await;
        outcome.results.push(result);

        if let Err(e) = save_progress(&params.progress_file, &outcome.results) {
            warn!(file = %params.progress_file.display(), error = %e, "Could not save progress");
        }
    }

    print_banner("IMPORT COMPLETE");
    println!("\nTotal players updated: {}", outcome.total_players());
    println!("Total roster entries: {}", outcome.total_rosters());
    println!("Total errors: {}", outcome.total_errors());

    if outcome.total_errors() > 0 {
        println!("\nSeasons with errors:");
        for result in outcome.results.iter().filter(|r| !r.errors.is_empty()) {
            if let Some(season) = result.season {
                println!("  {season}: {} errors", result.errors.len());
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cbbd::types::Hometown;

    fn player(start: Option<u16>, hometown: Option<&str>) -> RosterPlayer {
        RosterPlayer {
            id: AthleteId::new(7),
            source_id: Some(SourceId::new("4433")),
            name: "Jalen Brunson".to_string(),
            first_name: Some("Jalen".to_string()),
            last_name: Some("Brunson".to_string()),
            jersey: Some("1".to_string()),
            position: Some("G".to_string()),
            height: Some(74),
            weight: Some(190),
            hometown: hometown.map(|city| Hometown {
                city: Some(city.to_string()),
                state: Some("IL".to_string()),
                country: Some("USA".to_string()),
            }),
            start_season: start.map(Season::new),
            end_season: None,
        }
    }

    #[test]
    fn test_new_player_spans_listed_season() {
        let row = merge_player(None, &player(None, Some("Lincolnshire")), Season::new(2016), "now");
        assert_eq!(row.first_season, Season::new(2016));
        assert_eq!(row.last_season, Season::new(2016));
        assert_eq!(row.created_at, "now");
        assert!(row.roster_data_available);
        assert_eq!(row.hometown_city.as_deref(), Some("Lincolnshire"));
    }

    #[test]
    fn test_merge_widens_span_and_keeps_existing_fields() {
        let existing = ExistingPlayer {
            first_season: Some(Season::new(2016)),
            last_season: Some(Season::new(2017)),
            created_at: Some("earlier".to_string()),
            hometown_city: Some("Lincolnshire".to_string()),
            hometown_state: Some("IL".to_string()),
            hometown_country: None,
        };

        let row = merge_player(Some(&existing), &player(None, None), Season::new(2018), "now");

        assert_eq!(row.first_season, Season::new(2016));
        assert_eq!(row.last_season, Season::new(2018));
        assert_eq!(row.created_at, "earlier");
        assert_eq!(row.updated_at, "now");
        assert_eq!(row.hometown_city.as_deref(), Some("Lincolnshire"));
    }

    #[test]
    fn test_merge_uses_listed_start_season() {
        let existing = ExistingPlayer {
            first_season: Some(Season::new(2017)),
            last_season: Some(Season::new(2017)),
            ..Default::default()
        };
        let row = merge_player(Some(&existing), &player(Some(2015), None), Season::new(2018), "now");
        assert_eq!(row.first_season, Season::new(2015));
    }

    #[test]
    fn test_roster_entry_copies_listing() {
        let entry = roster_entry(&player(None, None), TeamId::new(3), Season::new(2018));
        assert_eq!(entry.athlete_id, AthleteId::new(7));
        assert_eq!(entry.team_id, TeamId::new(3));
        assert_eq!(entry.jersey.as_deref(), Some("1"));
    }

    #[test]
    fn test_save_progress_lists_seasons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.log");
        let results = vec![SeasonResult {
            season: Some(Season::new(2019)),
            players_updated: 12,
            rosters_inserted: 12,
            errors: vec!["boom".to_string()],
            ..Default::default()
        }];

        save_progress(&path, &results).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Import progress as of"));
        assert!(text.contains("Season 2019:\n  Players: 12\n  Rosters: 12\n  Errors: 1"));
    }
}
