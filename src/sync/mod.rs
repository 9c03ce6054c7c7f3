//! Keeps the in-memory item list in step with the store.
//!
//! A store call is first turned into a [`Completion`] (the call's result plus
//! the arguments it was issued with). [`ItemView::apply`] is the only code that
//! touches the in-memory list, and it does so only for confirmed results, so a
//! failed or no-op call leaves the list exactly as it was. Two dispatchers feed
//! completions into a view: [`Synchronizer`] runs calls inline on the caller's
//! thread, and [`StoreWorker`] runs them on a background thread so the TUI never
//! waits on disk.

mod worker;

pub use worker::StoreWorker;

use tracing::{debug, info, warn};

use crate::db::ItemStore;
use crate::error::StoreError;
use crate::models::Item;

/// One logical operation against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Refresh,
    Insert { label: String },
    Increment { id: i64 },
    Delete { id: i64 },
}

impl Request {
    /// Run the request against `store`. No in-memory state is involved here;
    /// the result is only a report of what the store did.
    pub fn execute<S: ItemStore + ?Sized>(self, store: &S) -> Completion {
        match self {
            Request::Refresh => Completion::Listed(store.list_all()),
            Request::Insert { label } => {
                let result = store.insert(&label);
                Completion::Inserted { label, result }
            }
            Request::Increment { id } => Completion::Incremented {
                id,
                result: store.increment_count(id),
            },
            Request::Delete { id } => Completion::Deleted {
                id,
                result: store.delete_by_id(id),
            },
        }
    }
}

/// What the store reported for a [`Request`].
#[derive(Debug)]
pub enum Completion {
    Listed(Result<Vec<Item>, StoreError>),
    Inserted {
        label: String,
        result: Result<i64, StoreError>,
    },
    Incremented {
        id: i64,
        result: Result<usize, StoreError>,
    },
    Deleted {
        id: i64,
        result: Result<usize, StoreError>,
    },
}

/// The mutation applied to the view after a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Refreshed { count: usize },
    Added(Item),
    Incremented(Item),
    Removed(Item),
}

/// Result of applying a [`Completion`] to an [`ItemView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The store confirmed the operation and the view now matches it.
    Applied(Change),
    /// The targeted id is not in the store. Nothing changed.
    NotFound { id: i64 },
    /// The store failed. Nothing changed.
    Rejected { reason: String },
    /// The store changed a row the view does not hold. The view is untouched
    /// and should be reconciled with a refresh.
    Diverged { id: i64 },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }
}

/// In-memory projection of the `items` table, in the order the store last
/// returned them followed by confirmed inserts.
#[derive(Debug, Clone, Default)]
pub struct ItemView {
    items: Vec<Item>,
}

impl ItemView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: i64) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Fold one confirmation into the list.
    pub fn apply(&mut self, completion: Completion) -> Outcome {
        match completion {
            Completion::Listed(Ok(items)) => {
                let count = items.len();
                self.items = items;
                info!(count, "loaded items from store");
                Outcome::Applied(Change::Refreshed { count })
            }
            Completion::Listed(Err(err)) => reject("refresh", &err),

            // A returned id is the confirmation for inserts; there is no
            // rows-affected value to check.
            Completion::Inserted {
                label,
                result: Ok(id),
            } => {
                let item = Item::fresh(id, label);
                self.items.push(item.clone());
                debug!(id, label = %item.label, "added item");
                Outcome::Applied(Change::Added(item))
            }
            Completion::Inserted { label, result: Err(err) } => {
                debug!(%label, "insert rejected");
                reject("add", &err)
            }

            Completion::Incremented { id, result: Ok(0) } => not_found("increment", id),
            Completion::Incremented { id, result: Ok(_) } => {
                let item = self.items.iter_mut().find(|item| item.id == id);
                match item.and_then(|item| item.count.checked_add(1).map(|next| (item, next))) {
                    Some((item, next)) => {
                        item.count = next;
                        debug!(id, count = item.count, "incremented item");
                        Outcome::Applied(Change::Incremented(item.clone()))
                    }
                    None => diverged("increment", id),
                }
            }
            Completion::Incremented { result: Err(err), .. } => reject("increment", &err),

            Completion::Deleted { id, result: Ok(0) } => not_found("delete", id),
            Completion::Deleted { id, result: Ok(_) } => match self.position(id) {
                Some(index) => {
                    let item = self.items.remove(index);
                    debug!(id, "removed item");
                    Outcome::Applied(Change::Removed(item))
                }
                None => diverged("delete", id),
            },
            Completion::Deleted { result: Err(err), .. } => reject("delete", &err),
        }
    }
}

fn reject(operation: &'static str, err: &StoreError) -> Outcome {
    warn!(
        operation,
        error = %err,
        cause = %err.root_message(),
        "store rejected operation, keeping last confirmed items"
    );
    Outcome::Rejected {
        reason: err.root_message(),
    }
}

fn not_found(operation: &'static str, id: i64) -> Outcome {
    debug!(operation, id, "no matching row");
    Outcome::NotFound { id }
}

fn diverged(operation: &'static str, id: i64) -> Outcome {
    warn!(operation, id, "store changed a row missing from the view");
    Outcome::Diverged { id }
}

/// Owns a store and its view and runs every operation inline.
pub struct Synchronizer<S> {
    store: S,
    view: ItemView,
}

impl<S: ItemStore> Synchronizer<S> {
    /// Start with an empty view. Call [`refresh`](Self::refresh) to load it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            view: ItemView::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        self.view.items()
    }

    pub fn view(&self) -> &ItemView {
        &self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the whole view with what the store holds now.
    pub fn refresh(&mut self) -> Outcome {
        self.dispatch(Request::Refresh)
    }

    pub fn add_item(&mut self, label: &str) -> Outcome {
        self.dispatch(Request::Insert {
            label: label.to_string(),
        })
    }

    pub fn increment_item(&mut self, id: i64) -> Outcome {
        self.dispatch(Request::Increment { id })
    }

    pub fn remove_item(&mut self, id: i64) -> Outcome {
        self.dispatch(Request::Delete { id })
    }

    fn dispatch(&mut self, request: Request) -> Outcome {
        let outcome = self.view.apply(request.execute(&self.store));
        if let Outcome::Diverged { .. } = outcome {
            self.view.apply(Request::Refresh.execute(&self.store));
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::db::{open_in_memory, SqliteStore};
    use crate::logging::init_test_logging;

    fn synced() -> Synchronizer<SqliteStore> {
        init_test_logging();
        let mut sync = Synchronizer::new(open_in_memory().unwrap());
        assert_eq!(
            sync.refresh(),
            Outcome::Applied(Change::Refreshed { count: 0 })
        );
        sync
    }

    /// In-memory fake whose writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStore {
        rows: RefCell<Vec<Item>>,
        next_id: Cell<i64>,
        failing: Cell<bool>,
    }

    impl FlakyStore {
        fn check(&self, operation: &'static str) -> Result<(), StoreError> {
            if self.failing.get() {
                Err(StoreError::storage(operation)(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
                    Some("disk I/O error".to_string()),
                )))
            } else {
                Ok(())
            }
        }
    }

    impl ItemStore for FlakyStore {
        fn ensure_schema(&self) -> Result<(), StoreError> {
            Ok(())
        }

        fn list_all(&self) -> Result<Vec<Item>, StoreError> {
            self.check("load items")?;
            Ok(self.rows.borrow().clone())
        }

        fn insert(&self, label: &str) -> Result<i64, StoreError> {
            self.check("insert item")?;
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            self.rows.borrow_mut().push(Item::fresh(id, label));
            Ok(id)
        }

        fn increment_count(&self, id: i64) -> Result<usize, StoreError> {
            self.check("increment item")?;
            let mut rows = self.rows.borrow_mut();
            Ok(rows
                .iter_mut()
                .filter(|item| item.id == id)
                .map(|item| item.count += 1)
                .count())
        }

        fn delete_by_id(&self, id: i64) -> Result<usize, StoreError> {
            self.check("delete item")?;
            let mut rows = self.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|item| item.id != id);
            Ok(before - rows.len())
        }
    }

    #[test]
    fn paris_scenario() {
        let mut sync = synced();

        assert!(sync.add_item("Paris").is_applied());
        assert_eq!(sync.items(), [Item::fresh(1, "Paris")]);

        sync.increment_item(1);
        sync.increment_item(1);
        assert_eq!(
            sync.items(),
            [Item {
                id: 1,
                label: "Paris".to_string(),
                count: 2,
            }]
        );

        assert_eq!(
            sync.remove_item(1),
            Outcome::Applied(Change::Removed(Item {
                id: 1,
                label: "Paris".to_string(),
                count: 2,
            }))
        );
        assert!(sync.items().is_empty());
    }

    #[test]
    fn added_id_matches_the_refreshed_row() {
        let mut sync = synced();

        let Outcome::Applied(Change::Added(added)) = sync.add_item("X") else {
            panic!("insert was not applied");
        };
        sync.refresh();

        assert_eq!(sync.items(), [Item::fresh(added.id, "X")]);
    }

    #[test]
    fn increments_are_monotonic() {
        let mut sync = synced();
        sync.add_item("Tokyo");
        let id = sync.items()[0].id;

        for expected in 1..=5 {
            let outcome = sync.increment_item(id);
            let Outcome::Applied(Change::Incremented(item)) = outcome else {
                panic!("unexpected outcome {outcome:?}");
            };
            assert_eq!(item.count, expected);
            assert_eq!(sync.view().get(id).unwrap().count, expected);
        }
    }

    #[test]
    fn missing_ids_leave_the_view_untouched() {
        let mut sync = synced();
        sync.add_item("Paris");
        sync.add_item("Berlin");
        let before = sync.items().to_vec();

        assert_eq!(sync.increment_item(42), Outcome::NotFound { id: 42 });
        assert_eq!(sync.remove_item(42), Outcome::NotFound { id: 42 });
        assert_eq!(sync.items(), before.as_slice());
    }

    #[test]
    fn deleted_items_stay_deleted_after_refresh() {
        let mut sync = synced();
        sync.add_item("Paris");
        sync.add_item("Berlin");
        let paris = sync.items()[0].id;

        assert!(sync.remove_item(paris).is_applied());
        sync.refresh();

        assert!(sync.view().get(paris).is_none());
        assert_eq!(sync.items().len(), 1);
    }

    #[test]
    fn store_failures_keep_the_last_confirmed_items() {
        init_test_logging();
        let mut sync = Synchronizer::new(FlakyStore::default());
        sync.add_item("Paris");
        sync.increment_item(1);
        let before = sync.items().to_vec();

        sync.store().failing.set(true);
        for outcome in [
            sync.add_item("Berlin"),
            sync.increment_item(1),
            sync.remove_item(1),
            sync.refresh(),
        ] {
            let Outcome::Rejected { reason } = outcome else {
                panic!("expected rejection, got {outcome:?}");
            };
            assert!(reason.contains("disk I/O error"), "{reason}");
        }
        assert_eq!(sync.items(), before.as_slice());

        sync.store().failing.set(false);
        assert!(sync.increment_item(1).is_applied());
        assert_eq!(sync.items()[0].count, 2);
    }

    #[test]
    fn rows_changed_behind_the_view_are_reconciled() {
        init_test_logging();
        let mut sync = Synchronizer::new(FlakyStore::default());
        sync.refresh();
        let id = sync.store().insert("Elsewhere").unwrap();

        assert_eq!(sync.increment_item(id), Outcome::Diverged { id });
        assert_eq!(
            sync.items(),
            [Item {
                id,
                label: "Elsewhere".to_string(),
                count: 1,
            }]
        );
    }

    #[test]
    fn increments_stop_at_the_largest_count() {
        let mut sync = synced();
        sync.add_item("Paris");
        sync.store()
            .connection()
            .execute("UPDATE items SET count = ?1 WHERE id = 1", [i64::MAX - 1])
            .unwrap();
        sync.refresh();

        let outcome = sync.increment_item(1);
        let Outcome::Applied(Change::Incremented(item)) = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(item.count, i64::MAX);

        assert_eq!(sync.increment_item(1), Outcome::NotFound { id: 1 });
        assert_eq!(sync.items()[0].count, i64::MAX);
    }

    #[test]
    fn view_does_not_overflow_a_full_count() {
        let mut view = ItemView::new();
        let full = Item {
            id: 1,
            label: "Paris".to_string(),
            count: i64::MAX,
        };
        view.apply(Completion::Listed(Ok(vec![full.clone()])));

        let outcome = view.apply(Completion::Incremented {
            id: 1,
            result: Ok(1),
        });
        assert_eq!(outcome, Outcome::Diverged { id: 1 });
        assert_eq!(view.items(), [full]);
    }

    #[test]
    fn view_ignores_confirmations_for_rows_it_never_saw() {
        let mut view = ItemView::new();
        let outcome = view.apply(Completion::Deleted {
            id: 9,
            result: Ok(1),
        });
        assert_eq!(outcome, Outcome::Diverged { id: 9 });
        assert!(view.is_empty());
    }
}
