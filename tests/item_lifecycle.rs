use std::time::Duration;

use tally_board::logging::init_test_logging;
use tally_board::{
    open_store, Change, Item, ItemStore, ItemView, Outcome, Request, StoreWorker, Synchronizer,
};

#[test]
fn paris_counter_from_empty_table_to_deleted() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut sync = Synchronizer::new(open_store(&dir.path().join("items.sqlite")).unwrap());
    sync.refresh();
    assert!(sync.items().is_empty());

    sync.add_item("Paris");
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

    sync.remove_item(1);
    assert!(sync.items().is_empty());
    sync.refresh();
    assert!(sync.items().is_empty());
}

#[test]
fn counts_survive_a_restart() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.sqlite");

    {
        let mut sync = Synchronizer::new(open_store(&path).unwrap());
        sync.refresh();
        sync.add_item("Berlin");
        sync.add_item("Madrid");
        sync.increment_item(2);
    }

    let store = open_store(&path).unwrap();
    store.ensure_schema().unwrap();
    let mut sync = Synchronizer::new(store);
    sync.refresh();
    assert_eq!(
        sync.items(),
        [
            Item::fresh(1, "Berlin"),
            Item {
                id: 2,
                label: "Madrid".to_string(),
                count: 1,
            },
        ]
    );
}

#[test]
fn worker_and_synchronizer_agree_on_the_same_file() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.sqlite");

    let mut worker = StoreWorker::spawn(open_store(&path).unwrap()).unwrap();
    let mut view = ItemView::new();
    for request in [
        Request::Refresh,
        Request::Insert {
            label: "Lisbon".to_string(),
        },
        Request::Increment { id: 1 },
    ] {
        worker.submit(request).unwrap();
    }
    let mut outcomes = Vec::new();
    while !worker.is_idle() {
        let completion = worker.wait(Duration::from_secs(5)).unwrap();
        outcomes.push(view.apply(completion));
    }
    drop(worker);

    assert!(matches!(
        outcomes.last(),
        Some(Outcome::Applied(Change::Incremented(_)))
    ));

    let mut sync = Synchronizer::new(open_store(&path).unwrap());
    sync.refresh();
    assert_eq!(sync.items(), view.items());
}
