pub mod cli;
pub mod config;
pub mod core;
pub mod providers;
pub mod store;
pub mod tracker;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::core::entry::EntryKind;
use crate::providers::awesome::AwesomeRateProvider;
use crate::store::DiskStore;
use crate::tracker::BalanceTracker;

/// Commands the application can execute, independent of the CLI surface.
pub enum AppCommand {
    Add {
        kind: EntryKind,
        amount: String,
        description: Option<String>,
    },
    List {
        kind: EntryKind,
    },
    Edit {
        kind: EntryKind,
        id: u64,
        amount: Option<String>,
        description: Option<String>,
    },
    Remove {
        kind: EntryKind,
        id: u64,
    },
    Summary,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fintrack starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // Explicit composition: the store and provider are built here and handed
    // to the tracker, nothing is reached through globals.
    let data_path = config.default_data_path()?.join("ledger");
    let store = DiskStore::open(&data_path)
        .with_context(|| format!("Failed to open ledger at {}", data_path.display()))?;
    let rates = AwesomeRateProvider::new(&config.endpoint, &config.pair);
    let tracker = BalanceTracker::new(Arc::new(store), Arc::new(rates));

    match command {
        AppCommand::Add {
            kind,
            amount,
            description,
        } => cli::entries::add(&tracker, kind, &amount, description, config.local_currency()).await,
        AppCommand::List { kind } => {
            cli::entries::list(&tracker, kind, config.local_currency());
            Ok(())
        }
        AppCommand::Edit {
            kind,
            id,
            amount,
            description,
        } => cli::entries::edit(&tracker, kind, id, amount, description).await,
        AppCommand::Remove { kind, id } => cli::entries::remove(&tracker, kind, id).await,
        AppCommand::Summary => cli::summary::run(&tracker, &config).await,
    }
}
