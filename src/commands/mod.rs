//! Command implementations for the import CLI

pub mod common;
pub mod csv_import;
pub mod diagnostics;
pub mod rankings;
pub mod rosters;
pub mod team_history;
pub mod venues;

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::{
    cbbd::CbbdClient,
    cli::Commands,
    core::ApiCredentials,
    error::ImportError,
    storage::Store,
    Result,
};
use csv_import::{handle_csv_import, CsvImportParams};
use rosters::{handle_rosters, RosterParams};
use team_history::{handle_team_history, TeamHistoryParams};

fn api_client() -> Result<CbbdClient> {
    let credentials = ApiCredentials::from_env()?;
    info!(base_url = %credentials.base_url, "Using stats API");
    CbbdClient::new(&credentials)
}

/// Run a command that writes to `store`.
pub async fn run<S: Store>(store: &mut S, command: Commands, data_dir: &Path) -> Result<()> {
    if let Some((kind, args)) = command.csv_job() {
        let summary = handle_csv_import(
            store,
            CsvImportParams {
                kind,
                data_dir: data_dir.to_path_buf(),
                source: args.file.clone(),
                clear: args.clear,
                on_duplicate: args.on_duplicate,
                batch_size: args.batch_size,
                failure_dir: args.failure_dir.clone(),
            },
        )
        .await?;
        info!(
            inserted = summary.report.inserted,
            failed = summary.report.failed.len(),
            "CSV import finished"
        );
        return Ok(());
    }

    match command {
        Commands::TeamHistory {
            seasons,
            delay_ms,
            fallback,
        } => {
            let api = api_client()?;
            let params = TeamHistoryParams {
                seasons: seasons.range(
                    team_history::DEFAULT_FIRST_SEASON,
                    team_history::DEFAULT_LAST_SEASON,
                ),
                delay: Duration::from_millis(delay_ms),
                fallback,
            };
            let outcome = handle_team_history(store, &api, params).await?;
            if !outcome.validation.is_clean() {
                warn!(
                    orphaned = outcome.validation.orphaned_conferences.len(),
                    duplicates = outcome.validation.duplicate_keys.len(),
                    "Conference history has validation issues"
                );
            }
        }

        Commands::Rosters {
            seasons,
            delay_ms,
            progress_file,
        } => {
            let api = api_client()?;
            let params = RosterParams {
                seasons: seasons.range(rosters::DEFAULT_FIRST_SEASON, rosters::DEFAULT_LAST_SEASON),
                delay: Duration::from_millis(delay_ms),
                progress_file,
            };
            handle_rosters(store, &api, params).await?;
        }

        Commands::Rankings => {
            let api = api_client()?;
            rankings::handle_rankings(store, &api).await?;
        }

        Commands::Venues => {
            let api = api_client()?;
            venues::handle_venues(store, &api).await?;
        }

        Commands::CheckEnv | Commands::RosterAvailability { .. } => run_without_store(command).await?,

        // CSV subcommands returned above.
        _ => {}
    }

    Ok(())
}

/// Run a command that never touches the datastore.
pub async fn run_without_store(command: Commands) -> Result<()> {
    match command {
        Commands::CheckEnv => diagnostics::handle_check_env(),
        Commands::RosterAvailability { seasons, delay_ms } => {
            let api = api_client()?;
            let range = seasons.range(
                diagnostics::AVAILABILITY_FIRST_SEASON,
                diagnostics::AVAILABILITY_LAST_SEASON,
            );
            diagnostics::handle_roster_availability(&api, range, Duration::from_millis(delay_ms)).await;
        }
        other => {
            return Err(ImportError::Aborted {
                reason: format!("{other:?} needs a datastore"),
            })
        }
    }
    Ok(())
}
