//! Database query functions for the `consumption_log` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{ConsumptionLogEntry, DateRange};

/// Parameters for appending a log row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub label: String,
    pub magnitude: Option<f64>,
    pub logged_at: DateTime<Utc>,
}

/// Append one log row. Returns the row with its server-assigned id.
pub async fn insert_log_entry(
    pool: &PgPool,
    owner_id: &str,
    new: &NewLogEntry,
) -> Result<ConsumptionLogEntry> {
    let entry = sqlx::query_as::<_, ConsumptionLogEntry>(
        "INSERT INTO consumption_log (owner_id, label, magnitude, logged_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(&new.label)
    .bind(new.magnitude)
    .bind(new.logged_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to log {:?} for {owner_id}", new.label))?;

    Ok(entry)
}

/// List an owner's log entries, newest first, optionally limited to an
/// inclusive range of UTC calendar dates.
pub async fn list_log_entries(
    pool: &PgPool,
    owner_id: &str,
    range: Option<DateRange>,
) -> Result<Vec<ConsumptionLogEntry>> {
    let range = range.unwrap_or_default();
    let entries = sqlx::query_as::<_, ConsumptionLogEntry>(
        "SELECT * FROM consumption_log \
         WHERE owner_id = $1 \
           AND ($2::date IS NULL OR (logged_at AT TIME ZONE 'UTC')::date >= $2) \
           AND ($3::date IS NULL OR (logged_at AT TIME ZONE 'UTC')::date <= $3) \
         ORDER BY logged_at DESC, id DESC",
    )
    .bind(owner_id)
    .bind(range.since)
    .bind(range.until)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list consumption log for {owner_id}"))?;

    Ok(entries)
}
