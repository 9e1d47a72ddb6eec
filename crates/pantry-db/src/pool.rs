//! Pool construction, embedded migrations and first-run database bootstrap.

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/pantry-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// The CLI runs one command per process and never fans out queries.
const POOL_SIZE: u32 = 3;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(POOL_SIZE)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("cannot reach pantry database at {}", config.database_url))
}

/// Bring the schema up to date. Already-applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("pantry schema migration failed")?;
    info!(known = MIGRATOR.iter().count(), "pantry schema up to date");
    Ok(())
}

/// The configured database name, if it can be spliced into
/// `CREATE DATABASE` (which takes no bind parameters).
pub fn checked_database_name(config: &DbConfig) -> Result<&str> {
    let name = config
        .database_name()
        .with_context(|| format!("no database name in {}", config.database_url))?;
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    ensure!(
        starts_ok && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        "database name {name:?} must be a plain identifier (letters, digits, underscore)"
    );
    Ok(name)
}

/// Create the pantry database on first run.
///
/// Talks to the server's `postgres` database over a single connection.
/// Returns `true` when the database was created, `false` when it was
/// already there.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let name = checked_database_name(config)?;
    let maintenance_url = config.maintenance_url();

    let mut conn = PgConnection::connect(&maintenance_url)
        .await
        .with_context(|| format!("cannot reach postgres server at {maintenance_url}"))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&mut conn)
            .await
            .context("failed to look up pg_database")?;

    if exists {
        debug!(db = name, "pantry database present");
    } else {
        conn.execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .with_context(|| format!("failed to create database {name}"))?;
        info!(db = name, "pantry database created");
    }

    conn.close().await.context("failed to close bootstrap connection")?;
    Ok(!exists)
}

/// What the pantry database currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PantrySummary {
    /// Owners with at least one item or log entry.
    pub owners: i64,
    pub items: i64,
    pub log_entries: i64,
}

pub async fn summarize(pool: &PgPool) -> Result<PantrySummary> {
    let (owners, items, log_entries): (i64, i64, i64) = sqlx::query_as(
        "SELECT \
           (SELECT COUNT(*) FROM ( \
              SELECT owner_id FROM inventory_items \
              UNION \
              SELECT owner_id FROM consumption_log) AS o), \
           (SELECT COUNT(*) FROM inventory_items), \
           (SELECT COUNT(*) FROM consumption_log)",
    )
    .fetch_one(pool)
    .await
    .context("failed to summarize pantry database")?;

    Ok(PantrySummary {
        owners,
        items,
        log_entries,
    })
}
