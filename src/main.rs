//! Binary entry point. Brings up configuration, logging, and the SQLite store,
//! then either runs one subcommand against the store or drives the Ratatui
//! event loop until the user exits.
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use tally_board::config::{Cli, Command, Config, DbLocation};
use tally_board::location::LocationPoller;
use tally_board::logging::{self, LogSink};
use tally_board::{
    open_in_memory, open_store, run_app, App, Outcome, SqliteStore, StoreWorker, Synchronizer,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    match cli.command.clone() {
        None => {
            logging::init(&config.log_filter, LogSink::File(&config.log_file))?;
            run_tui(&config)
        }
        Some(command) => {
            logging::init(&config.log_filter, LogSink::Stderr)?;
            run_command(&config, command)
        }
    }
}

fn open(config: &Config) -> Result<SqliteStore> {
    let store = match &config.db {
        DbLocation::File(path) => open_store(path),
        DbLocation::InMemory => open_in_memory(),
    }
    .context("could not initialise the item store")?;
    Ok(store)
}

fn run_tui(config: &Config) -> Result<()> {
    let store = open(config)?;
    let worker = StoreWorker::spawn(store).context("failed to start store worker")?;
    let poller = LocationPoller::spawn(config.place.provider(), config.refresh_interval)
        .context("failed to start location poller")?;
    info!(db = ?config.db, "starting tally board");

    let mut app = App::new(worker, Some(poller))?;
    run_app(&mut app)
}

/// One-shot operations for scripts. Each runs through the same synchronizer as
/// the tests, then prints the resulting list.
fn run_command(config: &Config, command: Command) -> Result<()> {
    let mut sync = Synchronizer::new(open(config)?);
    report(sync.refresh())?;

    match command {
        Command::List => {}
        Command::Add { label } => {
            let label = label
                .or_else(|| config.place.city.clone())
                .filter(|label| !label.trim().is_empty());
            let Some(label) = label else {
                bail!("no label given and no --city to default to");
            };
            report(sync.add_item(label.trim()))?;
        }
        Command::Increment { id } => report(sync.increment_item(id))?,
        Command::Remove { id } => report(sync.remove_item(id))?,
    }

    for item in sync.items() {
        println!("{:>5}  {:>6}  {}", item.id, item.count, item.label);
    }
    Ok(())
}

fn report(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Applied(_) | Outcome::Diverged { .. } => Ok(()),
        Outcome::NotFound { id } => {
            eprintln!("no item with id {id}");
            Ok(())
        }
        Outcome::Rejected { reason } => bail!(reason),
    }
}
