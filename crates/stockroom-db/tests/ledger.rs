//! Integration tests for the stock ledger.
//!
//! These run against a real PostgreSQL instance and are ignored by default:
//!
//! ```text
//! STOCKROOM_TEST_DATABASE_URL=postgres://localhost/stockroom_test \
//!     cargo test -p stockroom-db -- --ignored
//! ```
//!
//! Each test creates its own uniquely-coded items, so the suite can run
//! repeatedly against the same database.

use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use stockroom_core::stock::Direction;
use stockroom_core::{CoreError, ItemFields, MovementKind, UnitKind};
use stockroom_db::{Database, DbConfig, LedgerError};

async fn connect() -> Database {
    let url = std::env::var("STOCKROOM_TEST_DATABASE_URL")
        .expect("set STOCKROOM_TEST_DATABASE_URL to run ledger integration tests");
    Database::connect(DbConfig::new(url))
        .await
        .expect("failed to connect to test database")
}

fn unique_code(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{prefix}-{nanos}")
}

fn fields(code: &str, quantity: i64) -> ItemFields {
    ItemFields {
        code: code.to_string(),
        name: format!("Test item {code}"),
        description: None,
        quantity,
        unit_kind: UnitKind::Piece,
        unit_price: Decimal::new(250, 2),
        stock_min: 5,
        stock_max: 100,
        entered_at: None,
        image_url: None,
        image_ref: None,
        category_id: None,
        supplier_id: None,
    }
}

async fn count_movements(db: &Database, item_id: i64, kind: MovementKind) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM movements WHERE item_id = $1 AND kind = $2",
    )
    .bind(item_id)
    .bind(kind)
    .fetch_one(db.pool())
    .await
    .expect("movement count query failed")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn create_with_initial_stock_pairs_an_inbound_movement() {
    let db = connect().await;
    let ledger = db.ledger();

    let item = ledger
        .create_with_initial_stock(&fields(&unique_code("INIT"), 7), None)
        .await
        .unwrap();
    assert_eq!(item.quantity, 7);
    assert_eq!(count_movements(&db, item.id, MovementKind::Inbound).await, 1);

    let empty = ledger
        .create_with_initial_stock(&fields(&unique_code("EMPTY"), 0), None)
        .await
        .unwrap();
    assert_eq!(empty.quantity, 0);
    assert_eq!(
        count_movements(&db, empty.id, MovementKind::Inbound).await,
        0
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn oversized_outbound_changes_nothing() {
    let db = connect().await;
    let ledger = db.ledger();

    let item = ledger
        .create_with_initial_stock(&fields(&unique_code("OVER"), 3), None)
        .await
        .unwrap();

    let err = ledger
        .apply_delta(item.id, 5, Direction::Outbound, None)
        .await
        .unwrap_err();
    match err {
        LedgerError::Domain(CoreError::InsufficientStock {
            available,
            requested,
        }) => {
            assert_eq!(available, 3);
            assert_eq!(requested, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Quantity and history are untouched.
    let fresh = db.items().get(item.id).await.unwrap().unwrap();
    assert_eq!(fresh.quantity, 3);
    assert_eq!(
        count_movements(&db, item.id, MovementKind::Outbound).await,
        0
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn inbound_then_outbound_round_trips() {
    let db = connect().await;
    let ledger = db.ledger();

    let item = ledger
        .create_with_initial_stock(&fields(&unique_code("ROUND"), 20), None)
        .await
        .unwrap();

    let up = ledger
        .apply_delta(item.id, 10, Direction::Inbound, None)
        .await
        .unwrap();
    assert_eq!(up.new_quantity, 30);

    let down = ledger
        .apply_delta(item.id, 10, Direction::Outbound, None)
        .await
        .unwrap();
    assert_eq!(down.new_quantity, 20);
    assert_ne!(up.movement_id, down.movement_id);

    assert_eq!(count_movements(&db, item.id, MovementKind::Inbound).await, 2);
    assert_eq!(
        count_movements(&db, item.id, MovementKind::Outbound).await,
        1
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn delete_leaves_a_snapshot_tombstone() {
    let db = connect().await;
    let ledger = db.ledger();

    let code = unique_code("GONE");
    let item = ledger
        .create_with_initial_stock(&fields(&code, 0), None)
        .await
        .unwrap();

    let deleted = ledger.delete_with_snapshot(item.id, None).await.unwrap();
    assert_eq!(deleted.code, code);
    assert_eq!(deleted.name, item.name);

    // The item row is gone...
    assert!(db.items().get(item.id).await.unwrap().is_none());

    // ...and exactly one tombstone survives, carrying the snapshot. Its
    // item reference was nulled by the delete.
    let tombstones = sqlx::query_as::<_, (Option<i64>, Option<String>, Option<String>, i64)>(
        "SELECT item_id, item_name, item_code, quantity FROM movements \
         WHERE kind = 'deleted' AND item_code = $1",
    )
    .bind(&code)
    .fetch_all(db.pool())
    .await
    .unwrap();

    assert_eq!(tombstones.len(), 1);
    let (item_id, name, snap_code, quantity) = &tombstones[0];
    assert!(item_id.is_none());
    assert_eq!(name.as_deref(), Some(item.name.as_str()));
    assert_eq!(snap_code.as_deref(), Some(code.as_str()));
    assert_eq!(*quantity, 0);

    // Deleting again reports the missing item.
    assert!(matches!(
        ledger.delete_with_snapshot(item.id, None).await,
        Err(LedgerError::ItemNotFound { .. })
    ));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn concurrent_consumers_never_oversell() {
    const STOCK: i64 = 5;
    const CONSUMERS: usize = 8;

    let db = connect().await;
    let ledger = db.ledger();

    let item = ledger
        .create_with_initial_stock(&fields(&unique_code("RACE"), STOCK), None)
        .await
        .unwrap();

    let mut handles = Vec::with_capacity(CONSUMERS);
    for _ in 0..CONSUMERS {
        let ledger = ledger.clone();
        let item_id = item.id;
        handles.push(tokio::spawn(async move {
            ledger.apply_delta(item_id, 1, Direction::Outbound, None).await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.expect("consumer task panicked") {
            Ok(_) => succeeded += 1,
            Err(LedgerError::Domain(CoreError::InsufficientStock { .. })) => insufficient += 1,
            Err(other) => panic!("unexpected ledger error: {other:?}"),
        }
    }

    // Exactly one success per unit of available stock.
    assert_eq!(succeeded, STOCK);
    assert_eq!(insufficient as i64, CONSUMERS as i64 - STOCK);

    let fresh = db.items().get(item.id).await.unwrap().unwrap();
    assert_eq!(fresh.quantity, 0);
    assert_eq!(
        count_movements(&db, item.id, MovementKind::Outbound).await,
        STOCK
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn unknown_item_is_reported() {
    let db = connect().await;
    let ledger = db.ledger();

    let err = ledger
        .apply_delta(-1, 1, Direction::Inbound, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ItemNotFound { id: -1 }));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn low_stock_report_tracks_the_threshold() {
    let db = connect().await;
    let ledger = db.ledger();

    // stock_min is 5 in the fixture; an empty shelf is clearly low.
    let item = ledger
        .create_with_initial_stock(&fields(&unique_code("LOW"), 0), None)
        .await
        .unwrap();

    let low = db.reports().low_stock().await.unwrap();
    assert!(low.iter().any(|row| row.id == item.id));

    // Restock above the threshold and the item drops out of the report.
    ledger
        .apply_delta(item.id, 6, Direction::Inbound, None)
        .await
        .unwrap();

    let low = db.reports().low_stock().await.unwrap();
    assert!(!low.iter().any(|row| row.id == item.id));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (STOCKROOM_TEST_DATABASE_URL)"]
async fn edit_overwrites_and_records_movement() {
    let db = connect().await;
    let ledger = db.ledger();

    let item = ledger
        .create_with_initial_stock(&fields(&unique_code("EDIT"), 10), None)
        .await
        .unwrap();

    let mut changed = fields(&item.code, 42);
    changed.name = "Renamed".to_string();
    let updated = ledger.record_edit(item.id, &changed, None).await.unwrap();

    assert_eq!(updated.quantity, 42);
    assert_eq!(updated.name, "Renamed");
    assert_eq!(count_movements(&db, item.id, MovementKind::Edited).await, 1);
}
