//! Id-keyed reconciliation of an edited inventory view.
//!
//! The editor shows a snapshot that may already be stale by the time the user
//! saves. [`diff_quantities`] compares the edited quantities against the
//! committed ones by id and yields the minimal set of writes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use pantry_db::models::InventoryItem;

/// One row of the edited view: an id and the quantity the user typed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditedRow {
    pub id: i64,
    pub quantity: f64,
}

/// A write the ledger must perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityChange {
    Update { id: i64, quantity: f64 },
    /// The edit brought the quantity to zero.
    Delete { id: i64 },
}

/// Result of diffing an edited view against committed state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    /// Writes to perform, ordered by id.
    pub changes: Vec<QuantityChange>,
    /// Rows equal to their committed value.
    pub unchanged: usize,
    /// Ids the owner no longer has.
    pub stale: Vec<i64>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Diff `edited` against `committed` by id.
///
/// - A row equal to its committed quantity produces no change.
/// - A row whose id is not committed is reported as stale, never created.
/// - Negative or non-finite edits count as zero; zero produces a delete.
/// - When an id appears more than once, the last row wins.
pub fn diff_quantities(committed: &[InventoryItem], edited: &[EditedRow]) -> ReconcilePlan {
    let committed: HashMap<i64, f64> = committed.iter().map(|i| (i.id, i.quantity)).collect();

    let mut latest: BTreeMap<i64, f64> = BTreeMap::new();
    for row in edited {
        latest.insert(row.id, normalize(row.quantity));
    }

    let mut plan = ReconcilePlan::default();
    for (id, quantity) in latest {
        match committed.get(&id) {
            None => plan.stale.push(id),
            Some(&current) if current == quantity => plan.unchanged += 1,
            Some(_) if quantity <= 0.0 => plan.changes.push(QuantityChange::Delete { id }),
            Some(_) => plan.changes.push(QuantityChange::Update { id, quantity }),
        }
    }
    plan
}

fn normalize(quantity: f64) -> f64 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity
    } else {
        0.0
    }
}
