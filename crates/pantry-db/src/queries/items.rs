//! Database query functions for the `inventory_items` table.
//!
//! Every statement is keyed on `owner_id`; an id belonging to another owner
//! behaves exactly like a missing id.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;

use crate::models::{InventoryItem, NewItem};

/// Insert a new item row. Returns the row with its server-assigned id.
pub async fn insert_item(pool: &PgPool, owner_id: &str, new: &NewItem) -> Result<InventoryItem> {
    let added_at = new.added_at.unwrap_or_else(|| Utc::now().date_naive());
    let item = sqlx::query_as::<_, InventoryItem>(
        "INSERT INTO inventory_items (owner_id, name, category, quantity, added_at) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(&new.name)
    .bind(new.category.as_str())
    .bind(new.quantity)
    .bind(added_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert item {:?} for {owner_id}", new.name))?;

    Ok(item)
}

/// Fetch one item if it exists and belongs to `owner_id`.
pub async fn get_item(pool: &PgPool, owner_id: &str, id: i64) -> Result<Option<InventoryItem>> {
    let item = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items WHERE id = $1 AND owner_id = $2",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to fetch item {id}"))?;

    Ok(item)
}

/// List an owner's live items, oldest lot first.
pub async fn list_items(pool: &PgPool, owner_id: &str) -> Result<Vec<InventoryItem>> {
    let items = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items \
         WHERE owner_id = $1 AND quantity > 0 \
         ORDER BY added_at ASC, id ASC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list items for {owner_id}"))?;

    Ok(items)
}

/// Overwrite an item's quantity. Returns `false` when no row matched.
pub async fn update_quantity(pool: &PgPool, owner_id: &str, id: i64, quantity: f64) -> Result<bool> {
    let result =
        sqlx::query("UPDATE inventory_items SET quantity = $1 WHERE id = $2 AND owner_id = $3")
            .bind(quantity)
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await
            .with_context(|| format!("failed to update quantity of item {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Delete an item. Returns `false` when no row matched.
pub async fn delete_item(pool: &PgPool, owner_id: &str, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete item {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Delete every item for an owner. Returns the number of rows removed.
pub async fn delete_all_items(pool: &PgPool, owner_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM inventory_items WHERE owner_id = $1")
        .bind(owner_id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to discard items for {owner_id}"))?;

    Ok(result.rows_affected())
}
