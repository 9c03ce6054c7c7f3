//! Core library surface for Tally Board: location-labelled counters kept in an
//! embedded SQLite table, with an in-memory list that only ever reflects what
//! the store has confirmed.
pub mod config;
pub mod db;
pub mod error;
pub mod location;
pub mod logging;
pub mod models;
pub mod sync;
pub mod ui;

pub use db::{open_in_memory, open_store, ItemStore, SqliteStore};
pub use error::StoreError;
pub use models::{Address, Coordinates, Item};
pub use sync::{Change, ItemView, Outcome, Request, StoreWorker, Synchronizer};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
