//! Integration tests for the inventory ledger against the in-memory store.
//!
//! A thin counting wrapper records every write the ledger issues so the
//! "identical edit means zero writes" property can be checked directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use pantry_core::ledger::EditedRow;
use pantry_core::{InventoryLedger, MemoryStore, PantryError, PersistentStore};
use pantry_db::models::{Category, ConsumptionLogEntry, DateRange, InventoryItem, NewItem};
use pantry_db::queries::consumption_log::NewLogEntry;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Delegates to a [`MemoryStore`] and counts mutating calls.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistentStore for CountingStore {
    async fn create_item(&self, owner_id: &str, item: &NewItem) -> Result<InventoryItem> {
        self.bump();
        self.inner.create_item(owner_id, item).await
    }

    async fn get_item(&self, owner_id: &str, item_id: i64) -> Result<Option<InventoryItem>> {
        self.inner.get_item(owner_id, item_id).await
    }

    async fn list_items(&self, owner_id: &str) -> Result<Vec<InventoryItem>> {
        self.inner.list_items(owner_id).await
    }

    async fn update_quantity(&self, owner_id: &str, item_id: i64, quantity: f64) -> Result<bool> {
        self.bump();
        self.inner.update_quantity(owner_id, item_id, quantity).await
    }

    async fn delete_item(&self, owner_id: &str, item_id: i64) -> Result<bool> {
        self.bump();
        self.inner.delete_item(owner_id, item_id).await
    }

    async fn delete_all_items(&self, owner_id: &str) -> Result<u64> {
        self.bump();
        self.inner.delete_all_items(owner_id).await
    }

    async fn append_log_entry(
        &self,
        owner_id: &str,
        entry: &NewLogEntry,
    ) -> Result<ConsumptionLogEntry> {
        self.bump();
        self.inner.append_log_entry(owner_id, entry).await
    }

    async fn list_log(
        &self,
        owner_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<ConsumptionLogEntry>> {
        self.inner.list_log(owner_id, range).await
    }
}

fn counting_ledger() -> (InventoryLedger, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    (InventoryLedger::new(store.clone()), store)
}

fn on(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

async fn stock(ledger: &InventoryLedger, owner: &str) -> Vec<InventoryItem> {
    let mut out = Vec::new();
    for (name, category, qty, day) in [
        ("Rice", Category::ShelfStable, 1000.0, 1),
        ("Chicken thighs", Category::Meat, 600.0, 2),
        ("Spinach", Category::Vegetables, 250.0, 3),
    ] {
        let item = NewItem {
            added_at: Some(on(day)),
            ..NewItem::new(name, category, qty)
        };
        out.push(ledger.add(owner, item).await.unwrap());
    }
    out
}

fn as_edit(items: &[InventoryItem]) -> Vec<EditedRow> {
    items
        .iter()
        .map(|i| EditedRow {
            id: i.id,
            quantity: i.quantity,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// add / list_for
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_mints_distinct_ids_for_same_name() {
    let (ledger, _) = counting_ledger();
    let a = ledger
        .add("alice", NewItem::new("Milk", Category::Dairy, 1000.0))
        .await
        .unwrap();
    let b = ledger
        .add("alice", NewItem::new("Milk", Category::Dairy, 1000.0))
        .await
        .unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(ledger.list_for("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn add_rejects_bad_input_without_writing() {
    let (ledger, store) = counting_ledger();
    for item in [
        NewItem::new("  ", Category::Other, 100.0),
        NewItem::new("Salt", Category::ShelfStable, 0.0),
        NewItem::new("Salt", Category::ShelfStable, -3.0),
        NewItem::new("Salt", Category::ShelfStable, f64::NAN),
    ] {
        let err = ledger.add("alice", item).await.unwrap_err();
        assert!(matches!(err, PantryError::Validation(_)), "got {err:?}");
    }
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn add_trims_name() {
    let (ledger, _) = counting_ledger();
    let item = ledger
        .add("alice", NewItem::new("  Oats ", Category::ShelfStable, 500.0))
        .await
        .unwrap();
    assert_eq!(item.name, "Oats");
}

#[tokio::test]
async fn list_for_orders_by_added_date_then_id() {
    let (ledger, _) = counting_ledger();
    let late = ledger
        .add(
            "alice",
            NewItem {
                added_at: Some(on(9)),
                ..NewItem::new("Apples", Category::Fruit, 800.0)
            },
        )
        .await
        .unwrap();
    let early = stock(&ledger, "alice").await;

    let listed: Vec<i64> = ledger
        .list_for("alice")
        .await
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect();
    let mut expected: Vec<i64> = early.iter().map(|i| i.id).collect();
    expected.push(late.id);
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn owners_are_isolated() {
    let (ledger, _) = counting_ledger();
    stock(&ledger, "alice").await;
    assert!(ledger.list_for("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn get_returns_only_the_owners_item() {
    let (ledger, _) = counting_ledger();
    let items = stock(&ledger, "alice").await;

    let found = ledger.get("alice", items[1].id).await.unwrap().unwrap();
    assert_eq!(found.name, "Chicken thighs");
    assert!(ledger.get("bob", items[1].id).await.unwrap().is_none());

    ledger.delete("alice", items[1].id).await.unwrap();
    assert!(ledger.get("alice", items[1].id).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// reconcile_edit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_edit_issues_zero_writes() {
    let (ledger, store) = counting_ledger();
    let items = stock(&ledger, "alice").await;
    let before = store.writes();

    let report = ledger.reconcile_edit("alice", &as_edit(&items)).await.unwrap();

    assert_eq!(store.writes(), before);
    assert_eq!(report.writes(), 0);
    assert_eq!(report.unchanged, 3);
}

#[tokio::test]
async fn edit_of_only_stale_rows_issues_zero_writes() {
    let (ledger, store) = counting_ledger();
    stock(&ledger, "alice").await;
    let before = store.writes();

    let rows = [EditedRow { id: 999, quantity: 5.0 }];
    let report = ledger.reconcile_edit("alice", &rows).await.unwrap();

    assert_eq!(store.writes(), before);
    assert_eq!(report.stale, 1);
    assert_eq!(report.unchanged, 0);
}

#[tokio::test]
async fn edit_writes_only_changed_rows() {
    let (ledger, store) = counting_ledger();
    let items = stock(&ledger, "alice").await;
    let before = store.writes();

    let mut edit = as_edit(&items);
    edit[1].quantity = 450.0;
    let report = ledger.reconcile_edit("alice", &edit).await.unwrap();

    assert_eq!(store.writes() - before, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 2);
    let chicken = ledger
        .list_for("alice")
        .await
        .unwrap()
        .into_iter()
        .find(|i| i.id == items[1].id)
        .unwrap();
    assert_eq!(chicken.quantity, 450.0);
}

#[tokio::test]
async fn edit_to_zero_deletes_the_row() {
    let (ledger, _) = counting_ledger();
    let items = stock(&ledger, "alice").await;

    let mut edit = as_edit(&items);
    edit[2].quantity = 0.0;
    edit[0].quantity = -5.0;
    let report = ledger.reconcile_edit("alice", &edit).await.unwrap();

    assert_eq!(report.deleted, 2);
    let left = ledger.list_for("alice").await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, items[1].id);
}

#[tokio::test]
async fn stale_ids_are_dropped_never_recreated() {
    let (ledger, _) = counting_ledger();
    let items = stock(&ledger, "alice").await;
    let mut edit = as_edit(&items);

    // Eaten elsewhere while the editor was open.
    assert!(ledger.delete("alice", items[0].id).await.unwrap());
    edit[0].quantity = 900.0;
    edit.push(EditedRow {
        id: 9_999,
        quantity: 10.0,
    });

    let report = ledger.reconcile_edit("alice", &edit).await.unwrap();
    assert_eq!(report.stale, 2);
    assert_eq!(report.writes(), 0);

    let ids: Vec<i64> = ledger
        .list_for("alice")
        .await
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec![items[1].id, items[2].id]);
}

#[tokio::test]
async fn edit_cannot_touch_another_owners_items() {
    let (ledger, _) = counting_ledger();
    let alice = stock(&ledger, "alice").await;

    let report = ledger
        .reconcile_edit(
            "bob",
            &[EditedRow {
                id: alice[0].id,
                quantity: 1.0,
            }],
        )
        .await
        .unwrap();
    assert_eq!(report.stale, 1);
    assert_eq!(ledger.list_for("alice").await.unwrap()[0].quantity, 1000.0);
}

// ---------------------------------------------------------------------------
// delete / discard_all / seed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_is_idempotent() {
    let (ledger, _) = counting_ledger();
    let items = stock(&ledger, "alice").await;
    assert!(ledger.delete("alice", items[0].id).await.unwrap());
    assert!(!ledger.delete("alice", items[0].id).await.unwrap());
    assert!(!ledger.delete("bob", items[1].id).await.unwrap());
    assert_eq!(ledger.list_for("alice").await.unwrap().len(), 2);
}

#[tokio::test]
async fn discard_all_only_clears_one_owner() {
    let (ledger, _) = counting_ledger();
    stock(&ledger, "alice").await;
    stock(&ledger, "bob").await;
    assert_eq!(ledger.discard_all("alice").await.unwrap(), 3);
    assert_eq!(ledger.discard_all("alice").await.unwrap(), 0);
    assert!(ledger.list_for("alice").await.unwrap().is_empty());
    assert_eq!(ledger.list_for("bob").await.unwrap().len(), 3);
}

#[tokio::test]
async fn seed_demo_basket_stocks_an_empty_pantry() {
    let (ledger, _) = counting_ledger();
    let seeded = ledger.seed_demo_basket("alice").await.unwrap();
    assert!(!seeded.is_empty());
    assert_eq!(ledger.list_for("alice").await.unwrap().len(), seeded.len());
    assert!(seeded.iter().all(|i| i.quantity > 0.0));
}
