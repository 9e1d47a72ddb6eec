//! Ledger and consumption running on [`PgStore`].
//!
//! Each test gets its own freshly migrated database from `pantry-test-utils`.

use std::sync::Arc;

use pantry_core::ledger::EditedRow;
use pantry_core::{ConsumptionTransaction, InventoryLedger, PgStore, Usage, UsageOutcome};
use pantry_db::models::{Category, NewItem};
use pantry_test_utils::PantryTestDb;

#[tokio::test]
async fn ledger_round_trip_on_postgres() {
    let db = PantryTestDb::create().await;
    let ledger = InventoryLedger::new(Arc::new(PgStore::new(db.pool().clone())));

    let milk = ledger
        .add("alice", NewItem::new("Milk", Category::Dairy, 1000.0))
        .await
        .unwrap();
    let bread = ledger
        .add("alice", NewItem::new("Bread", Category::Custom("bakery".into()), 500.0))
        .await
        .unwrap();
    assert_eq!(bread.category, Category::Custom("bakery".into()));

    let report = ledger
        .reconcile_edit(
            "alice",
            &[
                EditedRow {
                    id: milk.id,
                    quantity: 1000.0,
                },
                EditedRow {
                    id: bread.id,
                    quantity: 0.0,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.deleted, 1);

    let live = ledger.list_for("alice").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, milk.id);
    assert!(ledger.list_for("bob").await.unwrap().is_empty());

    db.teardown().await;
}

#[tokio::test]
async fn consumption_logs_before_decrementing_on_postgres() {
    let db = PantryTestDb::create().await;
    let ledger = InventoryLedger::new(Arc::new(PgStore::new(db.pool().clone())));

    let eggs = ledger
        .add("alice", NewItem::new("Eggs", Category::Dairy, 100.0))
        .await
        .unwrap();
    let oats = ledger
        .add("alice", NewItem::new("Oats", Category::ShelfStable, 500.0))
        .await
        .unwrap();

    let tx = ConsumptionTransaction::new(&ledger);
    let receipt = tx
        .consume(
            "alice",
            &[Usage::tracked(eggs.id, 150.0), Usage::tracked(oats.id, 80.0)],
            "Omelette",
            Some(300.0),
        )
        .await
        .unwrap();

    assert_eq!(
        receipt.outcomes,
        vec![
            UsageOutcome::Exhausted { item_id: eggs.id },
            UsageOutcome::Decremented {
                item_id: oats.id,
                remaining: 420.0
            },
        ]
    );

    let log = tx.history("alice", None).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].label, "Omelette");
    assert_eq!(log[0].magnitude, Some(300.0));

    let live = ledger.list_for("alice").await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].quantity, 420.0);

    db.teardown().await;
}

#[tokio::test]
async fn seed_and_discard_on_postgres() {
    let db = PantryTestDb::create().await;
    let ledger = InventoryLedger::new(Arc::new(PgStore::new(db.pool().clone())));

    let seeded = ledger.seed_demo_basket("alice").await.unwrap();
    assert_eq!(
        ledger.discard_all("alice").await.unwrap(),
        seeded.len() as u64
    );
    assert!(ledger.list_for("alice").await.unwrap().is_empty());

    db.teardown().await;
}

#[tokio::test]
async fn get_sees_stocked_rows_for_their_owner_only() {
    let db = PantryTestDb::create().await;
    let stocked = db
        .stock("alice", &[("Lentils", Category::ShelfStable, 500.0)])
        .await;
    let ledger = InventoryLedger::new(Arc::new(PgStore::new(db.pool().clone())));

    let lentils = ledger.get("alice", stocked[0].id).await.unwrap().unwrap();
    assert_eq!(lentils.name, "Lentils");
    assert!(ledger.get("bob", stocked[0].id).await.unwrap().is_none());

    db.teardown().await;
}
