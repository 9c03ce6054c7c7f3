//! Error types for the persistence layer.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an [`ItemStore`](crate::db::ItemStore) or the worker
/// that drives it. A missing row is deliberately absent here: increments and
/// deletes report it as zero rows affected.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The directory that should hold the database could not be created.
    #[error("failed to create data directory {}", path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The database file could not be opened.
    #[error("failed to open database at {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Creating the `items` table failed. Nothing can be persisted after this.
    #[error("failed to create items table")]
    Schema(#[source] rusqlite::Error),

    /// A read or write statement failed inside the engine.
    #[error("failed to {operation}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The background store worker has shut down and cannot take requests.
    #[error("store worker is no longer running")]
    WorkerGone,
}

impl StoreError {
    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StoreError::Storage { operation, source }
    }

    /// The engine's own message, for example `no such table: items`.
    pub fn root_message(&self) -> String {
        match self {
            StoreError::DataDir { source, .. } => source.to_string(),
            StoreError::Open { source, .. }
            | StoreError::Schema(source)
            | StoreError::Storage { source, .. } => source.to_string(),
            StoreError::WorkerGone => self.to_string(),
        }
    }
}
