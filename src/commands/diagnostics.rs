//! Commands that inspect the environment or the API without writing anything.

use std::time::Duration;

use super::common::pause;
use crate::{
    cbbd::CbbdClient,
    cli::types::{Season, SeasonRange},
    core::config::env_report,
};

pub const AVAILABILITY_FIRST_SEASON: u16 = 2005;
pub const AVAILABILITY_LAST_SEASON: u16 = 2025;
pub const AVAILABILITY_DELAY_MS: u64 = 200;

/// Print which credentials are loaded, secrets masked.
pub fn handle_check_env() {
    for (name, value) in env_report() {
        match value {
            Some(value) => println!("✓ {name}: {value}"),
            None => println!("✗ {name}: not set"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available { teams: usize, players: usize },
    NoData,
    Failed(String),
}

pub fn default_availability_range() -> SeasonRange {
    SeasonRange::new(
        Season::new(AVAILABILITY_FIRST_SEASON),
        Season::new(AVAILABILITY_LAST_SEASON),
    )
}

/// Count the teams and players `/teams/roster` returns for each season.
pub async fn handle_roster_availability(
    api: &CbbdClient,
    seasons: SeasonRange,
    delay: Duration,
) -> Vec<(Season, Availability)> {
    println!("Testing roster data availability by season...\n");
    let mut results = Vec::with_capacity(seasons.len());

    for season in seasons.iter() {
        let availability = match api.fetch_rosters(season).await {
            Ok(rosters) if rosters.is_empty() => Availability::NoData,
            Ok(rosters) => Availability::Available {
                teams: rosters.len(),
                players: rosters.iter().map(|r| r.players.len()).sum(),
            },
            Err(e) => Availability::Failed(e.to_string()),
        };
        match &availability {
            Availability::Available { teams, players } => {
                println!("✓ {season}: {teams} teams, {players} players")
            }
            Availability::NoData => println!("✗ {season}: No data"),
            Availability::Failed(e) => println!("✗ {season}: Error - {e}"),
        }
        results.push((season, availability));
        pause(delay).await;
    }

    results
}
