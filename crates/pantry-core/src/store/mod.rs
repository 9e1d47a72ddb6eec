//! The `PersistentStore` trait -- the durable row store behind the ledger.
//!
//! ```text
//! InventoryLedger / ConsumptionTransaction
//!     |
//!     v
//! Arc<dyn PersistentStore>
//!     |-- PgStore      (PostgreSQL, production)
//!     `-- MemoryStore  (in-process)
//! ```
//!
//! Every method is keyed on the owner. Ids owned by someone else behave
//! exactly like missing ids. No cross-row atomicity is assumed by callers.

pub mod memory;
pub mod pg;

use anyhow::Result;
use async_trait::async_trait;

use pantry_db::models::{ConsumptionLogEntry, DateRange, InventoryItem, NewItem};
use pantry_db::queries::consumption_log::NewLogEntry;

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Durable storage for inventory items and the consumption log.
///
/// The trait is object-safe so the ledger can hold an
/// `Arc<dyn PersistentStore>`.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Insert a new item and return it with its freshly minted id.
    async fn create_item(&self, owner_id: &str, item: &NewItem) -> Result<InventoryItem>;

    /// One item, or `None` when the owner has no such id.
    async fn get_item(&self, owner_id: &str, item_id: i64) -> Result<Option<InventoryItem>>;

    /// All items currently stored for the owner.
    async fn list_items(&self, owner_id: &str) -> Result<Vec<InventoryItem>>;

    /// Overwrite a quantity. `quantity` is always positive; returns `false`
    /// when the owner has no such item.
    async fn update_quantity(&self, owner_id: &str, item_id: i64, quantity: f64) -> Result<bool>;

    /// Remove an item. Returns `false` when the owner has no such item.
    async fn delete_item(&self, owner_id: &str, item_id: i64) -> Result<bool>;

    /// Remove every item for the owner and return how many were removed.
    async fn delete_all_items(&self, owner_id: &str) -> Result<u64>;

    /// Append one entry to the consumption log.
    async fn append_log_entry(
        &self,
        owner_id: &str,
        entry: &NewLogEntry,
    ) -> Result<ConsumptionLogEntry>;

    /// Log entries, newest first, optionally limited to a date range.
    async fn list_log(
        &self,
        owner_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<ConsumptionLogEntry>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PersistentStore) {}
};
