use rusqlite::{params, Connection};

use super::ItemStore;
use crate::error::StoreError;
use crate::models::Item;

/// [`ItemStore`] backed by a live SQLite connection. The connection is owned,
/// so whoever holds the store is the only writer.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wrap an already opened connection. Call
    /// [`ensure_schema`](ItemStore::ensure_schema) before anything else.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl ItemStore for SqliteStore {
    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    label TEXT NOT NULL,
                    count INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )
            .map_err(StoreError::Schema)?;
        Ok(())
    }

    /// Rows come back in id order, which matches the order they were appended
    /// to the in-memory list.
    fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label, count FROM items ORDER BY id")
            .map_err(StoreError::storage("prepare item query"))?;

        let items = stmt
            .query_map([], |row| {
                Ok(Item {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    count: row.get(2)?,
                })
            })
            .map_err(StoreError::storage("load items"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::storage("collect items"))?;

        Ok(items)
    }

    fn insert(&self, label: &str) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO items (label, count) VALUES (?1, 0)",
                params![label],
            )
            .map_err(StoreError::storage("insert item"))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// A count already at `i64::MAX` is left alone and reported as zero rows.
    fn increment_count(&self, id: i64) -> Result<usize, StoreError> {
        self.conn
            .execute(
                "UPDATE items SET count = count + 1 WHERE id = ?1 AND count < ?2",
                params![id, i64::MAX],
            )
            .map_err(StoreError::storage("increment item"))
    }

    fn delete_by_id(&self, id: i64) -> Result<usize, StoreError> {
        self.conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])
            .map_err(StoreError::storage("delete item"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn ensure_schema_is_idempotent() {
        let store = open_in_memory().unwrap();
        let id = store.insert("Paris").unwrap();

        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();

        assert_eq!(store.list_all().unwrap(), vec![Item::fresh(id, "Paris")]);
    }

    #[test]
    fn ids_are_assigned_in_insertion_order() {
        let store = open_in_memory().unwrap();
        let first = store.insert("Paris").unwrap();
        let second = store.insert("Berlin").unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        let labels: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, ["Paris", "Berlin"]);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let store = open_in_memory().unwrap();
        let first = store.insert("Paris").unwrap();
        assert_eq!(store.delete_by_id(first).unwrap(), 1);

        let second = store.insert("Paris").unwrap();
        assert!(second > first);
    }

    #[test]
    fn increment_reports_rows_affected() {
        let store = open_in_memory().unwrap();
        let id = store.insert("Oslo").unwrap();

        assert_eq!(store.increment_count(id).unwrap(), 1);
        assert_eq!(store.increment_count(id).unwrap(), 1);
        assert_eq!(store.increment_count(id + 100).unwrap(), 0);

        assert_eq!(store.list_all().unwrap()[0].count, 2);
    }

    #[test]
    fn increment_stops_at_the_largest_count() {
        let store = open_in_memory().unwrap();
        let id = store.insert("Oslo").unwrap();
        store
            .connection()
            .execute(
                "UPDATE items SET count = ?1 WHERE id = ?2",
                params![i64::MAX - 1, id],
            )
            .unwrap();

        assert_eq!(store.increment_count(id).unwrap(), 1);
        assert_eq!(store.increment_count(id).unwrap(), 0);
        assert_eq!(store.list_all().unwrap()[0].count, i64::MAX);
    }

    #[test]
    fn delete_of_missing_row_is_a_noop() {
        let store = open_in_memory().unwrap();
        let id = store.insert("Rome").unwrap();

        assert_eq!(store.delete_by_id(id + 1).unwrap(), 0);
        assert_eq!(store.list_all().unwrap().len(), 1);
        assert_eq!(store.delete_by_id(id).unwrap(), 1);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn engine_failures_surface_as_storage_errors() {
        let store = open_in_memory().unwrap();
        store.connection().execute("DROP TABLE items", []).unwrap();

        let err = store.insert("Madrid").unwrap_err();
        assert!(
            matches!(err, StoreError::Storage { operation: "insert item", .. }),
            "{err:?}"
        );
        assert!(matches!(
            store.list_all().unwrap_err(),
            StoreError::Storage { .. }
        ));
    }
}
