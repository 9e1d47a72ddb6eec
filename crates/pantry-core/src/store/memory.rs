//! In-process [`PersistentStore`] used by tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;

use pantry_db::models::{ConsumptionLogEntry, DateRange, InventoryItem, NewItem};
use pantry_db::queries::consumption_log::NewLogEntry;

use super::PersistentStore;

#[derive(Debug)]
struct Tables {
    items: BTreeMap<i64, InventoryItem>,
    log: Vec<ConsumptionLogEntry>,
    next_item_id: i64,
    next_log_id: i64,
}

/// A store holding everything in memory behind a mutex.
///
/// Mirrors the PostgreSQL schema's constraints: quantities must stay
/// positive, ids are minted sequentially and never reused.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_first_id(1)
    }

    /// Start minting item ids at `first_id`.
    pub fn with_first_id(first_id: i64) -> Self {
        Self {
            tables: Mutex::new(Tables {
                items: BTreeMap::new(),
                log: Vec::new(),
                next_item_id: first_id,
                next_log_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))
    }
}

/// Mirrors `CHECK (quantity > 0)` on `inventory_items`.
fn ensure_positive(quantity: f64) -> Result<()> {
    if quantity.is_nan() || quantity <= 0.0 {
        bail!("quantity must be positive, got {quantity}");
    }
    Ok(())
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn create_item(&self, owner_id: &str, item: &NewItem) -> Result<InventoryItem> {
        ensure_positive(item.quantity)?;
        let mut t = self.lock()?;
        let id = t.next_item_id;
        t.next_item_id += 1;
        let row = InventoryItem {
            id,
            owner_id: owner_id.to_owned(),
            name: item.name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            added_at: item.added_at.unwrap_or_else(|| Utc::now().date_naive()),
        };
        t.items.insert(id, row.clone());
        Ok(row)
    }

    async fn get_item(&self, owner_id: &str, item_id: i64) -> Result<Option<InventoryItem>> {
        let t = self.lock()?;
        Ok(t.items
            .get(&item_id)
            .filter(|i| i.owner_id == owner_id)
            .cloned())
    }

    async fn list_items(&self, owner_id: &str) -> Result<Vec<InventoryItem>> {
        let t = self.lock()?;
        let mut rows: Vec<InventoryItem> = t
            .items
            .values()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_quantity(&self, owner_id: &str, item_id: i64, quantity: f64) -> Result<bool> {
        ensure_positive(quantity)?;
        let mut t = self.lock()?;
        match t.items.get_mut(&item_id) {
            Some(row) if row.owner_id == owner_id => {
                row.quantity = quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_item(&self, owner_id: &str, item_id: i64) -> Result<bool> {
        let mut t = self.lock()?;
        let owned = t
            .items
            .get(&item_id)
            .is_some_and(|row| row.owner_id == owner_id);
        if owned {
            t.items.remove(&item_id);
        }
        Ok(owned)
    }

    async fn delete_all_items(&self, owner_id: &str) -> Result<u64> {
        let mut t = self.lock()?;
        let before = t.items.len();
        t.items.retain(|_, row| row.owner_id != owner_id);
        Ok((before - t.items.len()) as u64)
    }

    async fn append_log_entry(
        &self,
        owner_id: &str,
        entry: &NewLogEntry,
    ) -> Result<ConsumptionLogEntry> {
        let mut t = self.lock()?;
        let id = t.next_log_id;
        t.next_log_id += 1;
        let row = ConsumptionLogEntry {
            id,
            owner_id: owner_id.to_owned(),
            label: entry.label.clone(),
            magnitude: entry.magnitude,
            logged_at: entry.logged_at,
        };
        t.log.push(row.clone());
        Ok(row)
    }

    async fn list_log(
        &self,
        owner_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<ConsumptionLogEntry>> {
        let range = range.unwrap_or_default();
        let t = self.lock()?;
        let mut rows: Vec<ConsumptionLogEntry> = t
            .log
            .iter()
            .filter(|e| e.owner_id == owner_id && range.contains(e.logged_at.date_naive()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.logged_at.cmp(&a.logged_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}
