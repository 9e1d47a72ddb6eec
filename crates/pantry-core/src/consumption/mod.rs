//! The consumption transaction: one eating event.
//!
//! Order matters. The log entry is appended first, then each tracked usage
//! is decremented. A failure halfway leaves the audit trail intact with some
//! decrements missing, which over-reports eating rather than losing it.
//!
//! The operation is deliberately not idempotent: every call models a real
//! meal, so calling it twice decrements twice.

pub mod report;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pantry_db::models::{ConsumptionLogEntry, DateRange};
use pantry_db::queries::consumption_log::NewLogEntry;

use crate::error::PantryError;
use crate::ledger::InventoryLedger;
use crate::store::PersistentStore;
use crate::suggest::RecipeCandidate;

pub use report::{DailyTotal, daily_totals};

/// How much of one item a meal used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// `None` for an ingredient the pantry does not track.
    pub item_id: Option<i64>,
    pub quantity_used: f64,
}

impl Usage {
    pub fn tracked(item_id: i64, quantity_used: f64) -> Self {
        Self {
            item_id: Some(item_id),
            quantity_used,
        }
    }
}

/// What happened to one usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UsageOutcome {
    Decremented { item_id: i64, remaining: f64 },
    /// Quantity reached zero; the item was removed.
    Exhausted { item_id: i64 },
    /// The item no longer exists for this owner; skipped.
    Stale { item_id: i64 },
    Untracked,
}

/// The log entry written plus one outcome per usage, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionReceipt {
    pub entry: ConsumptionLogEntry,
    pub outcomes: Vec<UsageOutcome>,
}

/// Applies eating events to an owner's ledger.
#[derive(Clone)]
pub struct ConsumptionTransaction {
    store: Arc<dyn PersistentStore>,
}

impl std::fmt::Debug for ConsumptionTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumptionTransaction").finish_non_exhaustive()
    }
}

impl ConsumptionTransaction {
    pub fn new(ledger: &InventoryLedger) -> Self {
        Self {
            store: Arc::clone(ledger.store()),
        }
    }

    /// Log one eating event and decrement the items it used.
    ///
    /// 1. Appends exactly one log entry, even when every usage is untracked
    ///    or stale.
    /// 2. For each tracked usage: `remaining = max(0, current - used)`;
    ///    zero deletes the item, anything else is persisted.
    ///
    /// The same id may appear in several usages; they compound.
    pub async fn consume(
        &self,
        owner_id: &str,
        usages: &[Usage],
        label: &str,
        magnitude: Option<f64>,
    ) -> Result<ConsumptionReceipt, PantryError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(PantryError::validation("consumption label must not be empty"));
        }
        if let Some(bad) = usages
            .iter()
            .find(|u| !u.quantity_used.is_finite() || u.quantity_used < 0.0)
        {
            return Err(PantryError::validation(format!(
                "quantity used must be a non-negative number, got {}",
                bad.quantity_used
            )));
        }

        let entry = self
            .store
            .append_log_entry(
                owner_id,
                &NewLogEntry {
                    label: label.to_owned(),
                    magnitude,
                    logged_at: Utc::now(),
                },
            )
            .await?;

        let mut current: HashMap<i64, f64> = self
            .store
            .list_items(owner_id)
            .await?
            .into_iter()
            .map(|i| (i.id, i.quantity))
            .collect();

        let mut outcomes = Vec::with_capacity(usages.len());
        for usage in usages {
            let Some(item_id) = usage.item_id else {
                outcomes.push(UsageOutcome::Untracked);
                continue;
            };
            let Some(&quantity) = current.get(&item_id) else {
                debug!(owner = owner_id, item_id, "usage references missing item; skipped");
                outcomes.push(UsageOutcome::Stale { item_id });
                continue;
            };

            let remaining = (quantity - usage.quantity_used).max(0.0);
            let outcome = if remaining <= 0.0 {
                current.remove(&item_id);
                if self.store.delete_item(owner_id, item_id).await? {
                    UsageOutcome::Exhausted { item_id }
                } else {
                    UsageOutcome::Stale { item_id }
                }
            } else {
                current.insert(item_id, remaining);
                if self.store.update_quantity(owner_id, item_id, remaining).await? {
                    UsageOutcome::Decremented { item_id, remaining }
                } else {
                    current.remove(&item_id);
                    UsageOutcome::Stale { item_id }
                }
            };
            outcomes.push(outcome);
        }

        info!(
            owner = owner_id,
            label = %entry.label,
            entry_id = entry.id,
            usages = usages.len(),
            "consumption recorded"
        );
        Ok(ConsumptionReceipt { entry, outcomes })
    }

    /// Cook a recipe: consume its tracked ingredients under its title.
    pub async fn cook(
        &self,
        owner_id: &str,
        recipe: &RecipeCandidate,
    ) -> Result<ConsumptionReceipt, PantryError> {
        let usages: Vec<Usage> = recipe
            .ingredient_usage
            .iter()
            .map(|u| Usage {
                item_id: u.item_id,
                quantity_used: u.quantity_needed,
            })
            .collect();
        self.consume(owner_id, &usages, &recipe.title, recipe.estimated_magnitude)
            .await
    }

    /// The owner's log, newest first.
    pub async fn history(
        &self,
        owner_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<ConsumptionLogEntry>, PantryError> {
        Ok(self.store.list_log(owner_id, range).await?)
    }
}
