use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;
use rusqlite::Connection;
use tracing::debug;

use super::{ItemStore, SqliteStore};
use crate::error::StoreError;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".tally-board";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "items.sqlite";
/// Path value that selects a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Open (or create) the database file at `path` and make sure the `items`
/// table exists before handing the store out.
pub fn open_store(path: &Path) -> Result<SqliteStore, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::DataDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let conn = Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "opened item database");

    let store = SqliteStore::new(conn);
    store.ensure_schema()?;
    Ok(store)
}

/// Same as [`open_store`] but nothing survives the process.
pub fn open_in_memory() -> Result<SqliteStore, StoreError> {
    let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
        path: PathBuf::from(IN_MEMORY),
        source,
    })?;

    let store = SqliteStore::new(conn);
    store.ensure_schema()?;
    Ok(store)
}

/// Database file inside an application data directory.
pub fn db_path_in(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

/// `~/.tally-board`, where the database and the log file live by default.
pub(crate) fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("items.sqlite");

        let store = open_store(&path).unwrap();
        assert!(path.exists());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn items_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.sqlite");

        let id = {
            let store = open_store(&path).unwrap();
            let id = store.insert("Lyon").unwrap();
            store.increment_count(id).unwrap();
            id
        };

        let reopened = open_store(&path).unwrap();
        let items = reopened.list_all().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, id);
        assert_eq!(items[0].label, "Lyon");
        assert_eq!(items[0].count, 1);
    }

    #[test]
    fn db_path_sits_inside_the_data_dir() {
        let dir = Path::new("/home/ana").join(DATA_DIR_NAME);
        assert_eq!(
            db_path_in(&dir),
            PathBuf::from("/home/ana/.tally-board/items.sqlite")
        );
    }
}
