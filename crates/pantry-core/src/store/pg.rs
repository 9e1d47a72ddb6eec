//! PostgreSQL-backed [`PersistentStore`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use pantry_db::models::{ConsumptionLogEntry, DateRange, InventoryItem, NewItem};
use pantry_db::queries::consumption_log::{self, NewLogEntry};
use pantry_db::queries::items;

use super::PersistentStore;

/// Store that delegates to the `pantry-db` query functions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PersistentStore for PgStore {
    async fn create_item(&self, owner_id: &str, item: &NewItem) -> Result<InventoryItem> {
        items::insert_item(&self.pool, owner_id, item).await
    }

    async fn get_item(&self, owner_id: &str, item_id: i64) -> Result<Option<InventoryItem>> {
        items::get_item(&self.pool, owner_id, item_id).await
    }

    async fn list_items(&self, owner_id: &str) -> Result<Vec<InventoryItem>> {
        items::list_items(&self.pool, owner_id).await
    }

    async fn update_quantity(&self, owner_id: &str, item_id: i64, quantity: f64) -> Result<bool> {
        items::update_quantity(&self.pool, owner_id, item_id, quantity).await
    }

    async fn delete_item(&self, owner_id: &str, item_id: i64) -> Result<bool> {
        items::delete_item(&self.pool, owner_id, item_id).await
    }

    async fn delete_all_items(&self, owner_id: &str) -> Result<u64> {
        items::delete_all_items(&self.pool, owner_id).await
    }

    async fn append_log_entry(
        &self,
        owner_id: &str,
        entry: &NewLogEntry,
    ) -> Result<ConsumptionLogEntry> {
        consumption_log::insert_log_entry(&self.pool, owner_id, entry).await
    }

    async fn list_log(
        &self,
        owner_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<ConsumptionLogEntry>> {
        consumption_log::list_log_entries(&self.pool, owner_id, range).await
    }
}
