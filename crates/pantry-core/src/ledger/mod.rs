//! The inventory ledger: an owner's live item records.
//!
//! Operations that name an id the owner does not have are silent no-ops.
//! The editor works from a slightly stale view, so a lost race must never
//! surface as an error.

pub mod reconcile;

use std::sync::Arc;

use tracing::{debug, info};

use pantry_db::models::{InventoryItem, NewItem};

use crate::error::PantryError;
use crate::presets;
use crate::store::PersistentStore;

pub use reconcile::{EditedRow, QuantityChange, ReconcilePlan, diff_quantities};

/// Counts of what a [`InventoryLedger::reconcile_edit`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Rows dropped because their id no longer exists.
    pub stale: usize,
}

impl ReconcileReport {
    pub fn writes(&self) -> usize {
        self.updated + self.deleted
    }
}

/// Item records for every owner, accessed one owner at a time.
#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn PersistentStore>,
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger").finish_non_exhaustive()
    }
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Add a new record with a freshly minted id.
    ///
    /// Never merges with an existing item of the same name: two lots bought
    /// on different days stay distinct.
    pub async fn add(&self, owner_id: &str, item: NewItem) -> Result<InventoryItem, PantryError> {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(PantryError::validation("item name must not be empty"));
        }
        if !item.quantity.is_finite() || item.quantity <= 0.0 {
            return Err(PantryError::validation(format!(
                "quantity for {name:?} must be a positive number, got {}",
                item.quantity
            )));
        }
        let item = NewItem {
            name: name.to_owned(),
            ..item
        };

        let created = self.store.create_item(owner_id, &item).await?;
        info!(owner = owner_id, item_id = created.id, name = %created.name, "item added");
        Ok(created)
    }

    /// All live records for the owner.
    pub async fn list_for(&self, owner_id: &str) -> Result<Vec<InventoryItem>, PantryError> {
        let mut items = self.store.list_items(owner_id).await?;
        items.retain(|i| i.quantity > 0.0);
        Ok(items)
    }

    /// One live record, or `None` when the owner has no such id.
    pub async fn get(
        &self,
        owner_id: &str,
        item_id: i64,
    ) -> Result<Option<InventoryItem>, PantryError> {
        let item = self.store.get_item(owner_id, item_id).await?;
        Ok(item.filter(|i| i.quantity > 0.0))
    }

    /// Apply an edited view of the owner's inventory.
    ///
    /// Only rows whose quantity differs from the committed value are
    /// written. Rows whose id has disappeared (for instance eaten in the
    /// meantime) are dropped; nothing is ever recreated.
    pub async fn reconcile_edit(
        &self,
        owner_id: &str,
        edited: &[EditedRow],
    ) -> Result<ReconcileReport, PantryError> {
        let committed = self.store.list_items(owner_id).await?;
        let plan = diff_quantities(&committed, edited);
        if plan.is_noop() {
            debug!(owner = owner_id, rows = edited.len(), "edit changes nothing; no writes");
            return Ok(ReconcileReport {
                unchanged: plan.unchanged,
                stale: plan.stale.len(),
                ..ReconcileReport::default()
            });
        }

        let mut report = ReconcileReport {
            unchanged: plan.unchanged,
            stale: plan.stale.len(),
            ..ReconcileReport::default()
        };

        for change in &plan.changes {
            match *change {
                QuantityChange::Update { id, quantity } => {
                    if self.store.update_quantity(owner_id, id, quantity).await? {
                        report.updated += 1;
                    } else {
                        report.stale += 1;
                    }
                }
                QuantityChange::Delete { id } => {
                    if self.store.delete_item(owner_id, id).await? {
                        report.deleted += 1;
                    } else {
                        report.stale += 1;
                    }
                }
            }
        }

        if report.stale > 0 {
            debug!(owner = owner_id, stale = ?plan.stale, "dropped edits for missing items");
        }
        info!(
            owner = owner_id,
            updated = report.updated,
            deleted = report.deleted,
            unchanged = report.unchanged,
            stale = report.stale,
            "inventory edit reconciled"
        );
        Ok(report)
    }

    /// Delete one item. Returns whether a record was removed; a missing id
    /// is not an error.
    pub async fn delete(&self, owner_id: &str, item_id: i64) -> Result<bool, PantryError> {
        let removed = self.store.delete_item(owner_id, item_id).await?;
        debug!(owner = owner_id, item_id, removed, "item delete");
        Ok(removed)
    }

    /// Remove every record for the owner.
    pub async fn discard_all(&self, owner_id: &str) -> Result<u64, PantryError> {
        let removed = self.store.delete_all_items(owner_id).await?;
        info!(owner = owner_id, removed, "inventory discarded");
        Ok(removed)
    }

    /// Stock the owner's pantry with the built-in demo basket.
    pub async fn seed_demo_basket(&self, owner_id: &str) -> Result<Vec<InventoryItem>, PantryError> {
        let basket = presets::demo_basket();
        let mut added = Vec::with_capacity(basket.len());
        for item in basket {
            added.push(self.add(owner_id, item).await?);
        }
        info!(owner = owner_id, count = added.len(), "demo basket seeded");
        Ok(added)
    }
}
