//! Definitions of the CSV import jobs and the per-file preparation step.

use std::collections::{HashMap, HashSet};

use clap::ValueEnum;
use serde_json::Value;

use super::{
    coerce::{coerce_cell, ColumnKind},
    columns::ColumnRenamer,
    reader::CsvTable,
};
use crate::storage::{tables, Record};

/// Where a job's CSV data lives, relative to the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvSource {
    File(&'static str),
    /// A folder of `<year>.csv` files.
    SeasonFolder(&'static str),
}

/// Everything needed to turn one CSV export into datastore rows.
#[derive(Debug)]
pub struct CsvJob {
    pub name: &'static str,
    pub table: &'static str,
    pub source: CsvSource,
    pub renamer: ColumnRenamer,
    /// Dropped whether they match the source header or the renamed column.
    pub drop_columns: &'static [&'static str],
    pub dedupe_key: &'static [&'static str],
    pub integer_columns: &'static [&'static str],
    pub boolean_columns: &'static [&'static str],
    pub date_columns: &'static [&'static str],
    pub json_columns: &'static [&'static str],
    pub text_columns: &'static [&'static str],
    /// Kind of every column not listed above.
    pub default_kind: ColumnKind,
    pub batch_size: usize,
    /// Column whose distinct values are counted in the profile.
    pub id_column: &'static str,
    /// Columns whose null counts are shown in the profile.
    pub profile_columns: &'static [&'static str],
}

/// The CSV-backed jobs, one subcommand each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CsvJobKind {
    Conferences,
    Teams,
    Games,
    TeamSeasonStats,
    TeamGameStats,
    PlayerSeasonStats,
    PlayerSeasonShootingStats,
    PlayerGameStats,
}

impl CsvJobKind {
    pub fn job(self) -> &'static CsvJob {
        match self {
            CsvJobKind::Conferences => &CONFERENCES,
            CsvJobKind::Teams => &TEAMS,
            CsvJobKind::Games => &GAMES,
            CsvJobKind::TeamSeasonStats => &TEAM_SEASON_STATS,
            CsvJobKind::TeamGameStats => &TEAM_GAME_STATS,
            CsvJobKind::PlayerSeasonStats => &PLAYER_SEASON_STATS,
            CsvJobKind::PlayerSeasonShootingStats => &PLAYER_SEASON_SHOOTING_STATS,
            CsvJobKind::PlayerGameStats => &PLAYER_GAME_STATS,
        }
    }
}

pub const CONFERENCES: CsvJob = CsvJob {
    name: "conferences",
    table: tables::CONFERENCES,
    source: CsvSource::File("conferences.csv"),
    renamer: ColumnRenamer::IDENTITY,
    drop_columns: &[],
    dedupe_key: &[],
    integer_columns: &["id"],
    boolean_columns: &[],
    date_columns: &[],
    json_columns: &[],
    text_columns: &["name", "abbreviation", "short_name"],
    default_kind: ColumnKind::Inferred,
    batch_size: 1000,
    id_column: "id",
    profile_columns: &["name", "abbreviation"],
};

pub const TEAMS: CsvJob = CsvJob {
    name: "teams",
    table: tables::TEAMS,
    source: CsvSource::File("teams.csv"),
    renamer: ColumnRenamer::IDENTITY,
    drop_columns: &[],
    dedupe_key: &[],
    integer_columns: &["id"],
    boolean_columns: &[],
    date_columns: &[],
    json_columns: &[],
    text_columns: &[
        "team",
        "mascot",
        "nickname",
        "abbreviation",
        "display_name",
        "primary_color",
        "secondary_color",
    ],
    default_kind: ColumnKind::Inferred,
    batch_size: 500,
    id_column: "id",
    profile_columns: &[
        "mascot",
        "nickname",
        "abbreviation",
        "display_name",
        "primary_color",
        "secondary_color",
    ],
};

/// Deduplicated on `id` with the policy chosen on the command line.
pub const GAMES: CsvJob = CsvJob {
    name: "games",
    table: tables::GAMES,
    source: CsvSource::File("games.csv"),
    renamer: ColumnRenamer::IDENTITY,
    drop_columns: &[],
    dedupe_key: &["id"],
    integer_columns: &[
        "id",
        "season",
        "venue_id",
        "home_team_id",
        "home_conference_id",
        "home_seed",
        "home_points",
        "away_team_id",
        "away_conference_id",
        "away_seed",
        "away_points",
    ],
    boolean_columns: &["neutral_site", "conference_game", "home_winner", "away_winner"],
    date_columns: &["start_date"],
    json_columns: &["home_period_points", "away_period_points"],
    text_columns: &[],
    default_kind: ColumnKind::Inferred,
    batch_size: 1000,
    id_column: "id",
    profile_columns: &[],
};

pub const TEAM_SEASON_STATS: CsvJob = CsvJob {
    name: "team-season-stats",
    table: tables::TEAM_SEASON_STATS,
    source: CsvSource::SeasonFolder("team_season_stats"),
    renamer: ColumnRenamer::SNAKE_CASE,
    drop_columns: &[],
    dedupe_key: &[],
    integer_columns: &["season", "team_id", "games", "wins", "losses"],
    boolean_columns: &[],
    date_columns: &[],
    json_columns: &[],
    text_columns: &["team", "conference", "season_label"],
    default_kind: ColumnKind::Number,
    batch_size: 200,
    id_column: "team_id",
    profile_columns: &[],
};

pub const TEAM_GAME_STATS: CsvJob = CsvJob {
    name: "team-game-stats",
    table: tables::TEAM_GAME_STATS,
    source: CsvSource::SeasonFolder("team_game_stats"),
    renamer: ColumnRenamer::SNAKE_CASE,
    drop_columns: &[
        "teamStats_points_byPeriod",
        "opponentStats_points_byPeriod",
        "conference",
        "opponentConference",
        "opponent_conference",
    ],
    dedupe_key: &["game_id", "team_id"],
    integer_columns: &[
        "game_id",
        "team_id",
        "season",
        "opponent_id",
        "game_minutes",
        "team_seed",
        "opponent_seed",
        "team_field_goals_attempted",
        "team_field_goals_made",
        "team_two_point_field_goals_attempted",
        "team_two_point_field_goals_made",
        "team_three_point_field_goals_attempted",
        "team_three_point_field_goals_made",
        "team_free_throws_attempted",
        "team_free_throws_made",
        "team_rebounds_total",
        "team_rebounds_defensive",
        "team_rebounds_offensive",
        "team_turnovers_team_total",
        "team_turnovers_total",
        "team_fouls_flagrant",
        "team_fouls_technical",
        "team_fouls_total",
        "team_points_fast_break",
        "team_points_off_turnovers",
        "team_points_in_paint",
        "team_points_total",
        "team_points_largest_lead",
        "team_points_by_period_0",
        "team_points_by_period_1",
        "team_points_by_period_2",
        "team_points_by_period_3",
        "team_points_by_period_4",
        "team_points_by_period_5",
        "team_points_by_period_6",
        "team_points_by_period_7",
        "team_points_by_period_8",
        "team_points_by_period_9",
        "team_points_by_period_10",
        "team_assists",
        "team_blocks",
        "team_steals",
        "team_possessions",
        "opponent_field_goals_attempted",
        "opponent_field_goals_made",
        "opponent_two_point_field_goals_attempted",
        "opponent_two_point_field_goals_made",
        "opponent_three_point_field_goals_attempted",
        "opponent_three_point_field_goals_made",
        "opponent_free_throws_attempted",
        "opponent_free_throws_made",
        "opponent_rebounds_total",
        "opponent_rebounds_defensive",
        "opponent_rebounds_offensive",
        "opponent_turnovers_team_total",
        "opponent_turnovers_total",
        "opponent_fouls_flagrant",
        "opponent_fouls_technical",
        "opponent_fouls_total",
        "opponent_points_fast_break",
        "opponent_points_off_turnovers",
        "opponent_points_in_paint",
        "opponent_points_total",
        "opponent_points_largest_lead",
        "opponent_points_by_period_0",
        "opponent_points_by_period_1",
        "opponent_points_by_period_2",
        "opponent_points_by_period_3",
        "opponent_points_by_period_4",
        "opponent_points_by_period_5",
        "opponent_points_by_period_6",
        "opponent_points_by_period_7",
        "opponent_points_by_period_8",
        "opponent_points_by_period_9",
        "opponent_points_by_period_10",
        "opponent_assists",
        "opponent_blocks",
        "opponent_steals",
        "opponent_possessions",
    ],
    boolean_columns: &["neutral_site", "is_home", "conference_game", "start_time_tbd"],
    date_columns: &["start_date"],
    json_columns: &[],
    text_columns: &[
        "team",
        "opponent",
        "season_label",
        "season_type",
        "game_type",
        "notes",
        "tournament",
    ],
    default_kind: ColumnKind::Number,
    batch_size: 500,
    id_column: "game_id",
    profile_columns: &[],
};

const PLAYER_COUNTING_STATS: &[&str] = &[
    "season",
    "athlete_id",
    "team_id",
    "games",
    "starts",
    "minutes",
    "points",
    "turnovers",
    "fouls",
    "assists",
    "steals",
    "blocks",
    "field_goals_attempted",
    "field_goals_made",
    "two_point_field_goals_attempted",
    "two_point_field_goals_made",
    "three_point_field_goals_attempted",
    "three_point_field_goals_made",
    "free_throws_attempted",
    "free_throws_made",
    "rebounds_total",
    "rebounds_defensive",
    "rebounds_offensive",
];

pub const PLAYER_SEASON_STATS: CsvJob = CsvJob {
    name: "player-season-stats",
    table: tables::PLAYER_SEASON_STATS,
    source: CsvSource::SeasonFolder("player_season_stats"),
    renamer: ColumnRenamer::SNAKE_CASE,
    drop_columns: &["conference"],
    dedupe_key: &["season", "athlete_id"],
    integer_columns: PLAYER_COUNTING_STATS,
    boolean_columns: &[],
    date_columns: &[],
    json_columns: &[],
    text_columns: &["name", "team", "season_label", "position"],
    default_kind: ColumnKind::Number,
    batch_size: 500,
    id_column: "athlete_id",
    profile_columns: &[],
};

pub const PLAYER_SEASON_SHOOTING_STATS: CsvJob = CsvJob {
    name: "player-season-shooting-stats",
    table: tables::PLAYER_SEASON_SHOOTING_STATS,
    source: CsvSource::SeasonFolder("player_season_shooting_stats"),
    renamer: ColumnRenamer::SNAKE_CASE,
    drop_columns: &["conference"],
    dedupe_key: &["season", "athlete_id"],
    integer_columns: &[
        "season",
        "team_id",
        "athlete_id",
        "tracked_shots",
        "dunks_made",
        "dunks_attempted",
        "dunks_assisted",
        "layups_made",
        "layups_attempted",
        "layups_assisted",
        "tip_ins_made",
        "tip_ins_attempted",
        "two_point_jumpers_made",
        "two_point_jumpers_attempted",
        "two_point_jumpers_assisted",
        "three_point_jumpers_made",
        "three_point_jumpers_attempted",
        "three_point_jumpers_assisted",
    ],
    boolean_columns: &[],
    date_columns: &[],
    json_columns: &[],
    text_columns: &["team", "athlete_name"],
    default_kind: ColumnKind::Number,
    batch_size: 200,
    id_column: "athlete_id",
    profile_columns: &[],
};

pub const PLAYER_GAME_STATS: CsvJob = CsvJob {
    name: "player-game-stats",
    table: tables::PLAYER_GAME_STATS,
    source: CsvSource::SeasonFolder("player_game_stats"),
    renamer: ColumnRenamer::SNAKE_CASE,
    drop_columns: &["conference", "opponent_conference"],
    dedupe_key: &["game_id", "athlete_id"],
    integer_columns: &[
        "game_id",
        "athlete_id",
        "season",
        "team_id",
        "opponent_id",
        "team_seed",
        "opponent_seed",
        "game_minutes",
        "game_pace",
        "minutes",
        "points",
        "assists",
        "turnovers",
        "fouls",
        "steals",
        "blocks",
        "field_goals_attempted",
        "field_goals_made",
        "two_point_field_goals_attempted",
        "two_point_field_goals_made",
        "three_point_field_goals_attempted",
        "three_point_field_goals_made",
        "free_throws_attempted",
        "free_throws_made",
        "rebounds_total",
        "rebounds_defensive",
        "rebounds_offensive",
    ],
    boolean_columns: &["neutral_site", "is_home", "conference_game", "starter", "ejected"],
    date_columns: &["start_date"],
    json_columns: &[],
    text_columns: &["name", "team", "opponent", "season_type", "game_type", "position"],
    default_kind: ColumnKind::Number,
    batch_size: 500,
    id_column: "game_id",
    profile_columns: &[],
};

impl CsvJob {
    pub fn column_kind(&self, column: &str) -> ColumnKind {
        let listed = |set: &[&str]| set.contains(&column);
        if listed(self.boolean_columns) {
            ColumnKind::Boolean
        } else if listed(self.integer_columns) {
            ColumnKind::Integer
        } else if listed(self.date_columns) {
            ColumnKind::Date
        } else if listed(self.json_columns) {
            ColumnKind::Json
        } else if listed(self.text_columns) {
            ColumnKind::Text
        } else {
            self.default_kind
        }
    }

    /// Map each source header to its output column, or `None` when dropped.
    pub fn output_columns(&self, headers: &[String]) -> Vec<Option<String>> {
        headers
            .iter()
            .map(|header| {
                let renamed = self.renamer.rename(header);
                let dropped = self
                    .drop_columns
                    .iter()
                    .any(|d| *d == header.trim() || *d == renamed);
                (!dropped && !renamed.is_empty()).then_some(renamed)
            })
            .collect()
    }

    /// Rename, drop and coerce every row of a CSV file.
    pub fn prepare(&self, table: &CsvTable) -> Vec<Record> {
        let columns = self.output_columns(&table.headers);
        let kinds: Vec<Option<(String, ColumnKind)>> = columns
            .into_iter()
            .map(|c| c.map(|name| {
                let kind = self.column_kind(&name);
                (name, kind)
            }))
            .collect();

        table
            .rows
            .iter()
            .map(|row| {
                let mut record = Record::new();
                for (i, slot) in kinds.iter().enumerate() {
                    if let Some((name, kind)) = slot {
                        let raw = row.get(i).unwrap_or("");
                        record.insert(name.clone(), coerce_cell(raw, *kind));
                    }
                }
                record
            })
            .collect()
    }
}

/// Pre-upload summary of prepared records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub total_rows: usize,
    pub unique_ids: usize,
    pub null_counts: Vec<(String, usize)>,
    pub duplicate_ids: usize,
}

pub fn profile(records: &[Record], id_column: &str, profile_columns: &[&str]) -> Profile {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicate_ids = 0;
    for record in records {
        let id = match record.get(id_column) {
            Some(Value::Null) | None => continue,
            Some(v) => v.to_string(),
        };
        if !seen.insert(id) {
            duplicate_ids += 1;
        }
    }

    let mut nulls: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for column in profile_columns {
            if record.get(*column).map_or(true, Value::is_null) {
                *nulls.entry(*column).or_insert(0) += 1;
            }
        }
    }

    Profile {
        total_rows: records.len(),
        unique_ids: seen.len(),
        null_counts: profile_columns
            .iter()
            .map(|c| (c.to_string(), nulls.get(c).copied().unwrap_or(0)))
            .collect(),
        duplicate_ids,
    }
}

impl Profile {
    pub fn print(&self, id_column: &str) {
        println!("  Total rows: {}", self.total_rows);
        println!("  Unique {id_column} values: {}", self.unique_ids);
        if !self.null_counts.is_empty() {
            println!("  Null counts:");
            for (column, count) in &self.null_counts {
                println!("    - {column}: {count}");
            }
        }
        if self.duplicate_ids > 0 {
            println!("  WARNING: {} duplicate {id_column} value(s)", self.duplicate_ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;
    use serde_json::json;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        }
    }

    #[test]
    fn test_team_game_stats_drops_and_renames() {
        let csv = table(
            &[
                "gameId",
                "teamId",
                "conference",
                "opponentConference",
                "teamStats_points_byPeriod",
                "teamStats_points_byPeriod_0",
                "isHome",
                "startDate",
                "pace",
            ],
            &[&["401", "5", "SEC", "ACC", "[30,40]", "30.0", "", "2024-11-04T23:30:00.000Z", "68.2"]],
        );

        let records = TEAM_GAME_STATS.prepare(&csv);
        let row = &records[0];

        assert_eq!(row.len(), 6);
        assert_eq!(row["game_id"], json!(401));
        assert_eq!(row["team_points_by_period_0"], json!(30));
        assert_eq!(row["is_home"], json!(false));
        assert_eq!(row["start_date"], json!("2024-11-04"));
        assert_eq!(row["pace"], json!(68.2));
        assert!(!row.contains_key("conference"));
        assert!(!row.contains_key("team_points_by_period"));
    }

    #[test]
    fn test_player_season_stats_renames() {
        let csv = table(
            &["athleteId", "season", "PORPAG", "winShares_totalPer40", "name", "conference"],
            &[&["7", "2024", "2.5", "0.12", "A Player", "Big 12"]],
        );

        let row = &PLAYER_SEASON_STATS.prepare(&csv)[0];
        assert_eq!(row["athlete_id"], json!(7));
        assert_eq!(row["porpag"], json!(2.5));
        assert_eq!(row["win_shares_total_per_40"], json!(0.12));
        assert_eq!(row["name"], json!("A Player"));
        assert!(!row.contains_key("conference"));
    }

    #[test]
    fn test_games_json_and_integers() {
        let csv = table(
            &["id", "season", "home_points", "home_period_points", "neutral_site", "status"],
            &[&["1", "2024", "77.0", "[40, 37]", "True", "final"]],
        );

        let row = &GAMES.prepare(&csv)[0];
        assert_eq!(row["home_points"], json!(77));
        assert_eq!(row["home_period_points"], json!([40, 37]));
        assert_eq!(row["neutral_site"], json!(true));
        assert_eq!(row["status"], json!("final"));
    }

    #[test]
    fn test_short_rows_fill_missing_cells() {
        let csv = table(&["id", "name", "abbreviation"], &[&["3", "Big Sky"]]);
        let row = &CONFERENCES.prepare(&csv)[0];
        assert!(row["abbreviation"].is_null());
    }

    #[test]
    fn test_profile_counts_nulls_and_duplicates() {
        let records: Vec<Record> = [
            json!({ "id": 1, "mascot": "Tigers" }),
            json!({ "id": 2, "mascot": null }),
            json!({ "id": 2, "mascot": null }),
        ]
        .into_iter()
        .map(|v| match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        })
        .collect();

        let p = profile(&records, "id", &["mascot"]);
        assert_eq!(p.total_rows, 3);
        assert_eq!(p.unique_ids, 2);
        assert_eq!(p.duplicate_ids, 1);
        assert_eq!(p.null_counts, vec![("mascot".to_string(), 2)]);
    }

    #[test]
    fn test_every_kind_maps_to_a_registered_table() {
        for kind in CsvJobKind::value_variants() {
            let job = kind.job();
            assert!(crate::storage::table_spec(job.table).is_ok(), "{}", job.name);
            assert!(job.batch_size > 0);
        }
    }
}
