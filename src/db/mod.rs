//! Persistence layer: one SQLite table of counters behind a small trait.

mod connection;
mod items;

pub(crate) use connection::data_dir;
pub use connection::{db_path_in, open_in_memory, open_store, IN_MEMORY};
pub use items::SqliteStore;

use crate::error::StoreError;
use crate::models::Item;

/// Everything the synchronizer needs from a backing store. Each mutating call
/// is a single statement, so it commits or fails as a unit.
///
/// Increment and delete report the number of rows they touched. Zero is a
/// normal outcome meaning the id no longer exists, never an error.
pub trait ItemStore {
    /// Create the `items` table if it is missing. Safe to call repeatedly.
    fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Every stored item, ordered by id.
    fn list_all(&self) -> Result<Vec<Item>, StoreError>;

    /// Insert a new row with a zero count and return its id.
    fn insert(&self, label: &str) -> Result<i64, StoreError>;

    fn increment_count(&self, id: i64) -> Result<usize, StoreError>;

    fn delete_by_id(&self, id: i64) -> Result<usize, StoreError>;
}
