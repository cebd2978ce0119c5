//! CLI argument definitions and parsing.

pub mod types;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use types::{Season, SeasonRange};

use crate::{
    commands::{diagnostics, rosters, team_history},
    core::BackendChoice,
    history::FallbackPolicy,
    ingest::{CsvJobKind, DuplicatePolicy},
};

/// Options shared by every CSV import.
#[derive(Debug, Clone, Args)]
pub struct CsvArgs {
    /// CSV file (or season folder) to read instead of the default under `--data-dir`.
    #[clap(long)]
    pub file: Option<PathBuf>,

    /// Delete every row of the target table before importing.
    #[clap(long)]
    pub clear: bool,

    /// Rows per upload request; defaults to the job's own size.
    #[clap(long)]
    pub batch_size: Option<usize>,

    /// Directory for `import_failures_*.json`.
    #[clap(long, default_value = ".")]
    pub failure_dir: PathBuf,

    /// What to do with rows sharing a dedupe key.
    #[clap(long, value_enum, default_value_t = DuplicatePolicy::First)]
    pub on_duplicate: DuplicatePolicy,
}

/// Inclusive season range.
#[derive(Debug, Clone, Args)]
pub struct SeasonArgs {
    /// First season to import.
    #[clap(long)]
    pub from: Option<Season>,

    /// Last season to import.
    #[clap(long)]
    pub to: Option<Season>,
}

impl SeasonArgs {
    pub fn range(&self, first: u16, last: u16) -> SeasonRange {
        SeasonRange::new(
            self.from.unwrap_or(Season::new(first)),
            self.to.unwrap_or(Season::new(last)),
        )
    }
}

#[derive(Debug, Parser)]
#[clap(
    name = "hoops-import",
    about = "Import college basketball data into a relational datastore"
)]
pub struct Cli {
    /// Datastore backend.
    #[clap(long, value_enum, global = true, default_value_t = BackendChoice::Auto)]
    pub backend: BackendChoice,

    /// SQLite database file (implies the sqlite backend under `auto`).
    #[clap(long, global = true, env = "HOOPS_IMPORT_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory holding the CSV exports.
    #[clap(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    /// Debug-level logging.
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import `conferences.csv`.
    Conferences(CsvArgs),
    /// Import `teams.csv`.
    Teams(CsvArgs),
    /// Import `games.csv`.
    Games(CsvArgs),
    /// Import `team_season_stats/<year>.csv`.
    TeamSeasonStats(CsvArgs),
    /// Import `team_game_stats/<year>.csv`.
    TeamGameStats(CsvArgs),
    /// Import `player_season_stats/<year>.csv`.
    PlayerSeasonStats(CsvArgs),
    /// Import `player_season_shooting_stats/<year>.csv`.
    PlayerSeasonShootingStats(CsvArgs),
    /// Import `player_game_stats/<year>.csv`.
    PlayerGameStats(CsvArgs),

    /// Fetch conferences and teams from the API and rebuild conference history.
    ///
    /// Every season is fetched before resolution starts; the history table
    /// is replaced as a whole.
    TeamHistory {
        #[clap(flatten)]
        seasons: SeasonArgs,

        /// Milliseconds between season requests.
        #[clap(long, default_value_t = team_history::DEFAULT_DELAY_MS)]
        delay_ms: u64,

        /// Handling of duplicate listings with no later single conference.
        #[clap(long, value_enum, default_value_t = FallbackPolicy::Smallest)]
        fallback: FallbackPolicy,
    },

    /// Import players and roster entries from `/teams/roster`.
    Rosters {
        #[clap(flatten)]
        seasons: SeasonArgs,

        /// Milliseconds between season requests.
        #[clap(long, default_value_t = rosters::DEFAULT_DELAY_MS)]
        delay_ms: u64,

        /// File rewritten with per-season results after each season.
        #[clap(long, default_value = rosters::DEFAULT_PROGRESS_FILE)]
        progress_file: PathBuf,
    },

    /// Import every poll ranking from `/rankings`.
    Rankings,

    /// Import venues from `/venues`.
    Venues,

    /// Show which credentials are loaded.
    CheckEnv,

    /// Count teams and players `/teams/roster` returns per season.
    RosterAvailability {
        #[clap(flatten)]
        seasons: SeasonArgs,

        /// Milliseconds between season requests.
        #[clap(long, default_value_t = diagnostics::AVAILABILITY_DELAY_MS)]
        delay_ms: u64,
    },
}

impl Commands {
    /// The CSV job and its options, for the CSV subcommands.
    pub fn csv_job(&self) -> Option<(CsvJobKind, &CsvArgs)> {
        let pair = match self {
            Commands::Conferences(args) => (CsvJobKind::Conferences, args),
            Commands::Teams(args) => (CsvJobKind::Teams, args),
            Commands::Games(args) => (CsvJobKind::Games, args),
            Commands::TeamSeasonStats(args) => (CsvJobKind::TeamSeasonStats, args),
            Commands::TeamGameStats(args) => (CsvJobKind::TeamGameStats, args),
            Commands::PlayerSeasonStats(args) => (CsvJobKind::PlayerSeasonStats, args),
            Commands::PlayerSeasonShootingStats(args) => (CsvJobKind::PlayerSeasonShootingStats, args),
            Commands::PlayerGameStats(args) => (CsvJobKind::PlayerGameStats, args),
            _ => return None,
        };
        Some(pair)
    }

    /// Whether the command needs a datastore connection.
    pub fn needs_store(&self) -> bool {
        !matches!(self, Commands::CheckEnv | Commands::RosterAvailability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_subcommand_with_globals() {
        let cli = Cli::try_parse_from([
            "hoops-import",
            "--backend",
            "sqlite",
            "games",
            "--on-duplicate",
            "last",
            "--clear",
        ])
        .unwrap();

        assert_eq!(cli.backend, BackendChoice::Sqlite);
        let (kind, args) = cli.command.csv_job().unwrap();
        assert_eq!(kind, CsvJobKind::Games);
        assert_eq!(args.on_duplicate, DuplicatePolicy::Last);
        assert!(args.clear);
    }

    #[test]
    fn test_parse_team_history_range_and_fallback() {
        let cli = Cli::try_parse_from([
            "hoops-import",
            "team-history",
            "--from",
            "2000",
            "--to",
            "2010",
            "--fallback",
            "unresolved",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::TeamHistory {
                seasons,
                delay_ms,
                fallback,
            } => {
                let range = seasons.range(1925, 2025);
                assert_eq!(range.first, Season::new(2000));
                assert_eq!(range.last, Season::new(2010));
                assert_eq!(delay_ms, 100);
                assert_eq!(fallback, FallbackPolicy::Unresolved);
            }
            other => panic!("Expected TeamHistory, got {other:?}"),
        }
    }

    #[test]
    fn test_diagnostics_do_not_need_a_store() {
        let cli = Cli::try_parse_from(["hoops-import", "check-env"]).unwrap();
        assert!(!cli.command.needs_store());
        assert!(cli.command.csv_job().is_none());

        let cli = Cli::try_parse_from(["hoops-import", "rankings"]).unwrap();
        assert!(cli.command.needs_store());
    }
}
