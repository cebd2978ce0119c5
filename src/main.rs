//! Entry point: parse CLI, open the datastore and dispatch to command handlers.

use anyhow::Context;
use clap::Parser;
use hoops_import::{
    cli::Cli,
    commands::{run, run_without_store},
    core::{
        config::{load_dotenv, resolve_store_target},
        logging, StoreTarget,
    },
    storage::{ImportDatabase, PostgrestStore},
};
use tracing::info;

/// Run the CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if !cli.command.needs_store() {
        run_without_store(cli.command).await?;
        return Ok(());
    }

    let target = resolve_store_target(cli.backend, cli.database)
        .context("Failed to select a datastore")?;

    match target {
        StoreTarget::Sqlite(path) => {
            info!(path = %path.display(), "Using SQLite datastore");
            let mut db = ImportDatabase::open(&path)
                .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;
            run(&mut db, cli.command, &cli.data_dir).await?;
        }
        StoreTarget::Postgrest(credentials) => {
            info!(url = %credentials.url, "Using hosted datastore");
            let mut store =
                PostgrestStore::new(&credentials).context("Failed to create datastore client")?;
            run(&mut store, cli.command, &cli.data_dir).await?;
        }
    }

    Ok(())
}
