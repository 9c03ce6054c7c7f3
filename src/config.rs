//! Command-line surface and the settings resolved from it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::db::{data_dir, db_path_in, IN_MEMORY};
use crate::location::FixedLocation;
use crate::models::{Address, Coordinates};

/// Name of the log file written next to the database while the TUI runs.
const LOG_FILE_NAME: &str = "tally-board.log";

#[derive(Parser, Debug)]
#[command(name = "tally-board", version, about = "Location-labelled counters in your terminal")]
pub struct Cli {
    /// SQLite database file. Use `:memory:` for a throwaway session.
    #[arg(long, env = "TALLY_BOARD_DB")]
    pub db: Option<PathBuf>,

    /// Seconds between location refreshes.
    #[arg(
        long,
        env = "TALLY_BOARD_REFRESH_SECS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub refresh_secs: u64,

    /// Log filter directive, e.g. `debug` or `tally_board=trace`.
    #[arg(long, env = "TALLY_BOARD_LOG", default_value = "info")]
    pub log: String,

    #[command(flatten)]
    pub place: PlaceArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Position and address reported by the fixed location provider.
#[derive(Args, Debug, Default, Clone)]
pub struct PlaceArgs {
    #[arg(long, allow_negative_numbers = true, requires = "longitude")]
    pub latitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true, requires = "latitude")]
    pub longitude: Option<f64>,

    #[arg(long)]
    pub street: Option<String>,

    #[arg(long)]
    pub street_number: Option<String>,

    /// Also the default label for new items.
    #[arg(long)]
    pub city: Option<String>,

    /// ISO country code.
    #[arg(long)]
    pub country: Option<String>,
}

impl PlaceArgs {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    pub fn address(&self) -> Address {
        Address {
            street: self.street.clone(),
            street_number: self.street_number.clone(),
            city: self.city.clone(),
            iso_country_code: self.country.clone(),
        }
    }

    pub fn provider(&self) -> FixedLocation {
        FixedLocation::new(self.coordinates(), self.address())
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every item.
    List,
    /// Add an item. The label defaults to `--city`.
    Add { label: Option<String> },
    /// Increment an item's count.
    Increment { id: i64 },
    /// Delete an item.
    Remove { id: i64 },
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    InMemory,
}

/// Settings resolved from [`Cli`] plus platform defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub db: DbLocation,
    pub log_file: PathBuf,
    pub log_filter: String,
    pub refresh_interval: Duration,
    pub place: PlaceArgs,
}

impl Config {
    /// Fill in missing paths from `~/.tally-board`.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::resolve(cli, data_dir)
    }

    /// `data_dir` is only consulted when the command line leaves a path open.
    fn resolve(cli: &Cli, data_dir: impl Fn() -> Result<PathBuf>) -> Result<Self> {
        if cli.log.trim().is_empty() {
            bail!("log filter must not be empty");
        }

        let db = match &cli.db {
            Some(path) if path.as_os_str() == IN_MEMORY => DbLocation::InMemory,
            Some(path) => DbLocation::File(path.clone()),
            None => DbLocation::File(db_path_in(&data_dir()?)),
        };

        let log_file = match &db {
            DbLocation::File(path) => path.with_file_name(LOG_FILE_NAME),
            DbLocation::InMemory => data_dir()?.join(LOG_FILE_NAME),
        };

        Ok(Self {
            db,
            log_file,
            log_filter: cli.log.trim().to_string(),
            refresh_interval: Duration::from_secs(cli.refresh_secs),
            place: cli.place.clone(),
        })
    }
}
