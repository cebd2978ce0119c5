//! Registry of the tables the import jobs write.

use crate::error::{ImportError, Result};

pub const CONFERENCES: &str = "conferences";
pub const TEAMS: &str = "teams";
pub const TEAM_CONFERENCE_HISTORY: &str = "team_conference_history";
pub const VENUES: &str = "venues";
pub const RANKINGS: &str = "rankings";
pub const PLAYERS: &str = "players";
pub const PLAYER_TEAM_ROSTERS: &str = "player_team_rosters";
pub const GAMES: &str = "games";
pub const TEAM_SEASON_STATS: &str = "team_season_stats";
pub const TEAM_GAME_STATS: &str = "team_game_stats";
pub const PLAYER_SEASON_STATS: &str = "player_season_stats";
pub const PLAYER_SEASON_SHOOTING_STATS: &str = "player_season_shooting_stats";
pub const PLAYER_GAME_STATS: &str = "player_game_stats";

/// A table known to the importer.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    /// Non-null column used to address "all rows" in filtered deletes.
    pub guard_column: &'static str,
    /// SQLite DDL. Stats tables only declare their key; the remaining
    /// columns are added as the CSV files introduce them.
    pub ddl: &'static str,
}

pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: CONFERENCES,
        guard_column: "id",
        ddl: "CREATE TABLE IF NOT EXISTS conferences (
                id INTEGER PRIMARY KEY,
                name TEXT,
                abbreviation TEXT,
                short_name TEXT
            )",
    },
    TableSpec {
        name: TEAMS,
        guard_column: "id",
        ddl: "CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY,
                source_id TEXT UNIQUE,
                school TEXT,
                mascot TEXT,
                abbreviation TEXT,
                display_name TEXT,
                short_display_name TEXT,
                primary_color TEXT,
                secondary_color TEXT,
                current_venue_id INTEGER,
                current_venue TEXT,
                current_city TEXT,
                current_state TEXT,
                last_active_season INTEGER
            )",
    },
    TableSpec {
        name: TEAM_CONFERENCE_HISTORY,
        guard_column: "id",
        ddl: "CREATE TABLE IF NOT EXISTS team_conference_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_id INTEGER NOT NULL REFERENCES teams(id),
                season INTEGER NOT NULL,
                conference_id INTEGER,
                existed INTEGER NOT NULL DEFAULT 1,
                UNIQUE (team_id, season)
            )",
    },
    TableSpec {
        name: VENUES,
        guard_column: "id",
        ddl: "CREATE TABLE IF NOT EXISTS venues (
                id INTEGER PRIMARY KEY,
                source_id TEXT,
                name TEXT NOT NULL,
                city TEXT,
                state TEXT,
                country TEXT,
                created_at TEXT,
                updated_at TEXT
            )",
    },
    TableSpec {
        name: RANKINGS,
        guard_column: "season",
        ddl: "CREATE TABLE IF NOT EXISTS rankings (
                season INTEGER NOT NULL,
                season_type TEXT NOT NULL,
                week INTEGER NOT NULL,
                poll_date TEXT,
                poll_type TEXT NOT NULL,
                team_id INTEGER NOT NULL,
                team TEXT,
                conference TEXT,
                ranking INTEGER,
                points INTEGER,
                first_place_votes INTEGER,
                created_at TEXT,
                updated_at TEXT,
                PRIMARY KEY (season, season_type, week, poll_type, team_id)
            )",
    },
    TableSpec {
        name: PLAYERS,
        guard_column: "id",
        ddl: "CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY,
                source_id TEXT,
                name TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                position TEXT,
                height INTEGER,
                weight INTEGER,
                hometown_city TEXT,
                hometown_state TEXT,
                hometown_country TEXT,
                first_season INTEGER,
                last_season INTEGER,
                roster_data_available INTEGER,
                created_at TEXT,
                updated_at TEXT
            )",
    },
    TableSpec {
        name: PLAYER_TEAM_ROSTERS,
        guard_column: "athlete_id",
        ddl: "CREATE TABLE IF NOT EXISTS player_team_rosters (
                athlete_id INTEGER NOT NULL,
                team_id INTEGER NOT NULL,
                season INTEGER NOT NULL,
                jersey TEXT,
                position TEXT,
                height INTEGER,
                weight INTEGER,
                PRIMARY KEY (athlete_id, team_id, season)
            )",
    },
    TableSpec {
        name: GAMES,
        guard_column: "id",
        ddl: "CREATE TABLE IF NOT EXISTS games (id INTEGER PRIMARY KEY)",
    },
    TableSpec {
        name: TEAM_SEASON_STATS,
        guard_column: "season",
        ddl: "CREATE TABLE IF NOT EXISTS team_season_stats (
                season INTEGER NOT NULL,
                team_id INTEGER NOT NULL,
                PRIMARY KEY (season, team_id)
            )",
    },
    TableSpec {
        name: TEAM_GAME_STATS,
        guard_column: "game_id",
        ddl: "CREATE TABLE IF NOT EXISTS team_game_stats (
                game_id INTEGER NOT NULL,
                team_id INTEGER NOT NULL,
                PRIMARY KEY (game_id, team_id)
            )",
    },
    TableSpec {
        name: PLAYER_SEASON_STATS,
        guard_column: "season",
        ddl: "CREATE TABLE IF NOT EXISTS player_season_stats (
                season INTEGER NOT NULL,
                athlete_id INTEGER NOT NULL,
                PRIMARY KEY (season, athlete_id)
            )",
    },
    TableSpec {
        name: PLAYER_SEASON_SHOOTING_STATS,
        guard_column: "season",
        ddl: "CREATE TABLE IF NOT EXISTS player_season_shooting_stats (
                season INTEGER NOT NULL,
                athlete_id INTEGER NOT NULL,
                PRIMARY KEY (season, athlete_id)
            )",
    },
    TableSpec {
        name: PLAYER_GAME_STATS,
        guard_column: "game_id",
        ddl: "CREATE TABLE IF NOT EXISTS player_game_stats (
                game_id INTEGER NOT NULL,
                athlete_id INTEGER NOT NULL,
                PRIMARY KEY (game_id, athlete_id)
            )",
    },
];

/// Look up a table by name.
pub fn table_spec(name: &str) -> Result<&'static TableSpec> {
    TABLES
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ImportError::UnknownTable {
            table: name.to_string(),
        })
}
